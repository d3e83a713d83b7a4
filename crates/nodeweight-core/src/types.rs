//! Resource model for objects delivered by the cluster event source.
//!
//! Only [`Node`] carries meaning for weight resolution. Every other kind is
//! kept as an [`OtherResource`] so handlers can still forward it, and
//! deletes observed without a final state arrive wrapped in a
//! [`DeletedFinalStateUnknown`] tombstone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique name of a node within the cluster.
pub type NodeName = String;

/// Kind string for node objects on the wire.
pub const NODE_KIND: &str = "Node";

/// Kind string for tombstone wrappers on the wire.
pub const TOMBSTONE_KIND: &str = "DeletedFinalStateUnknown";

// ── Metadata ──────────────────────────────────────────────────────

/// Identity and free-form metadata shared by every resource kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub uid: Option<String>,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
}

impl ObjectMeta {
    /// Metadata with just a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style annotation insert.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// ── Node ──────────────────────────────────────────────────────────

/// Snapshot of a cluster node as observed by the event source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub metadata: ObjectMeta,
    pub spec: NodeSpec,
    /// Volatile, kubelet-reported state. Ignored when comparing updates.
    pub status: NodeStatus,
}

/// Desired configuration of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeSpec {
    pub pod_cidr: Option<String>,
    pub provider_id: Option<String>,
    pub unschedulable: bool,
    pub taints: Vec<Taint>,
}

/// Scheduling taint applied to a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Taint {
    pub key: String,
    pub value: Option<String>,
    pub effect: String,
}

/// Observed state of a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStatus {
    pub addresses: Vec<NodeAddress>,
    pub conditions: Vec<NodeCondition>,
    /// Resource name → quantity string (e.g. `"cpu" → "4"`).
    pub capacity: HashMap<String, String>,
}

/// Address reachable on a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: String,
    pub address: String,
}

/// Condition reported by the node agent (Ready, MemoryPressure, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    pub reason: Option<String>,
}

impl Node {
    /// A node with the given name and no annotations.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            ..Self::default()
        }
    }

    /// Builder-style annotation insert.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_annotation(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn annotations(&self) -> &HashMap<String, String> {
        &self.metadata.annotations
    }

    /// Compare two snapshots, skipping `status`.
    ///
    /// Status churns on every heartbeat and never affects weight, so two
    /// snapshots that differ only there describe the same node.
    pub fn eq_ignoring_status(&self, other: &Node) -> bool {
        self.metadata == other.metadata && self.spec == other.spec
    }
}

// ── Other kinds ───────────────────────────────────────────────────

/// Any resource kind the weight pipeline does not interpret.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OtherResource {
    pub kind: String,
    pub metadata: ObjectMeta,
}

/// Tombstone delivered on delete when the source missed the final state.
///
/// Carries the last object the source knew about plus its store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedFinalStateUnknown {
    pub key: String,
    pub obj: Box<Payload>,
}

impl DeletedFinalStateUnknown {
    pub fn new(key: impl Into<String>, obj: Payload) -> Self {
        Self {
            key: key.into(),
            obj: Box::new(obj),
        }
    }
}

// ── Payload ───────────────────────────────────────────────────────

/// Object carried by an add, update, or delete callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Node(Node),
    Tombstone(DeletedFinalStateUnknown),
    Other(OtherResource),
}

impl Payload {
    /// Wire kind of this payload, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Payload::Node(_) => NODE_KIND,
            Payload::Tombstone(_) => TOMBSTONE_KIND,
            Payload::Other(other) => &other.kind,
        }
    }

    /// Object name; the store key for tombstones.
    pub fn name(&self) -> &str {
        match self {
            Payload::Node(node) => node.name(),
            Payload::Tombstone(tombstone) => &tombstone.key,
            Payload::Other(other) => &other.metadata.name,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Payload::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Equality that skips node status. Payloads of different kinds are
    /// never equivalent.
    pub fn eq_ignoring_status(&self, other: &Payload) -> bool {
        match (self, other) {
            (Payload::Node(a), Payload::Node(b)) => a.eq_ignoring_status(b),
            (a, b) => a == b,
        }
    }
}

impl From<Node> for Payload {
    fn from(node: Node) -> Self {
        Payload::Node(node)
    }
}

impl From<OtherResource> for Payload {
    fn from(other: OtherResource) -> Self {
        Payload::Other(other)
    }
}

impl From<DeletedFinalStateUnknown> for Payload {
    fn from(tombstone: DeletedFinalStateUnknown) -> Self {
        Payload::Tombstone(tombstone)
    }
}
