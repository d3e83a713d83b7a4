//! Node weight cache — resolves and stores per-node weights from events.
//!
//! The cache is one stage in a chain of [`EventHandler`]s. Node events
//! update the weight table; every event, whatever its payload, is then
//! forwarded unchanged to the next stage.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use nodeweight_core::{Node, NodeName, Payload, WeightConfig, DEFAULT_NODE_WEIGHT, MAX_NODE_WEIGHT};

use crate::handler::EventHandler;
use crate::resolver::resolve_node_weight;

/// Lookup closure handed to collaborators that only need weights.
pub type NodeWeightFunc = Arc<dyn Fn(&str) -> u32 + Send + Sync>;

/// Deepest tombstone nesting unwrapped on delete before giving up.
pub const MAX_TOMBSTONE_DEPTH: usize = 8;

type WeightTable = Arc<Mutex<HashMap<NodeName, u32>>>;

/// Event handler that tracks a weight for every node it has seen.
///
/// Events are expected from a single dispatch thread, while
/// [`weight_of_node`](Self::weight_of_node) may be called from anywhere.
/// Both paths share one mutex held for a single map operation.
pub struct NodeWeightCache {
    annotation: String,
    default_weight: u32,
    next: Option<Arc<dyn EventHandler>>,
    weights: WeightTable,
}

impl NodeWeightCache {
    /// Create a cache reading `annotation` and falling back to `default_weight`.
    ///
    /// A default above [`MAX_NODE_WEIGHT`] is replaced by
    /// [`DEFAULT_NODE_WEIGHT`] so stored weights stay within range.
    /// [`from_config`](Self::from_config) never hits this, since config
    /// validation rejects such defaults.
    pub fn new(annotation: impl Into<String>, default_weight: u32) -> Self {
        let default_weight = if default_weight > MAX_NODE_WEIGHT {
            warn!(
                default_weight,
                max = MAX_NODE_WEIGHT,
                fallback = DEFAULT_NODE_WEIGHT,
                "default weight out of range"
            );
            DEFAULT_NODE_WEIGHT
        } else {
            default_weight
        };

        Self {
            annotation: annotation.into(),
            default_weight,
            next: None,
            weights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &WeightConfig) -> Self {
        Self::new(config.annotation(), config.default_weight())
    }

    /// Set the handler that receives every event after this stage.
    pub fn with_next(mut self, next: Arc<dyn EventHandler>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn default_weight(&self) -> u32 {
        self.default_weight
    }

    /// Current weight of `node_name`.
    ///
    /// Unknown nodes and nodes stored with weight 0 both return the
    /// default, so a `"0"` annotation cannot be told apart from no
    /// annotation at all.
    pub fn weight_of_node(&self, node_name: &str) -> u32 {
        lookup(&self.weights, node_name, self.default_weight)
    }

    /// A lookup closure sharing this cache's live table.
    pub fn weight_func(&self) -> NodeWeightFunc {
        let weights = Arc::clone(&self.weights);
        let default_weight = self.default_weight;
        Arc::new(move |node_name: &str| lookup(&weights, node_name, default_weight))
    }

    /// Number of nodes with a stored weight.
    pub fn len(&self) -> usize {
        lock(&self.weights).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.weights).is_empty()
    }

    /// Copy of the raw table, ordered by node name.
    pub fn snapshot(&self) -> BTreeMap<NodeName, u32> {
        lock(&self.weights)
            .iter()
            .map(|(name, weight)| (name.clone(), *weight))
            .collect()
    }

    fn update_node_weight(&self, node: &Node) {
        let weight = resolve_node_weight(node.annotations(), &self.annotation, self.default_weight);

        let previous = lock(&self.weights).insert(node.name().to_string(), weight);
        if previous != Some(weight) {
            debug!(node = node.name(), weight, ?previous, "node weight updated");
        }
    }

    fn delete_node_weight(&self, node_name: &str) {
        // Nothing scheduled can still reference a deleted node, so only
        // the table entry goes.
        if let Some(weight) = lock(&self.weights).remove(node_name) {
            debug!(node = node_name, weight, "node weight removed");
        }
    }

    fn delete_payload(&self, obj: &Payload) {
        let mut current = obj;
        for _ in 0..=MAX_TOMBSTONE_DEPTH {
            match current {
                Payload::Node(node) => {
                    self.delete_node_weight(node.name());
                    return;
                }
                Payload::Tombstone(tombstone) => current = tombstone.obj.as_ref(),
                Payload::Other(_) => {
                    unexpected("delete", current);
                    return;
                }
            }
        }
        warn!(
            handler = "delete",
            key = obj.name(),
            max_depth = MAX_TOMBSTONE_DEPTH,
            "tombstone nested too deeply, ignoring"
        );
    }

    fn forward(&self, f: impl FnOnce(&dyn EventHandler)) {
        if let Some(next) = &self.next {
            f(next.as_ref());
        }
    }
}

impl EventHandler for NodeWeightCache {
    fn on_add(&self, obj: &Payload) {
        match obj {
            Payload::Node(node) => self.update_node_weight(node),
            _ => unexpected("add", obj),
        }
        self.forward(|next| next.on_add(obj));
    }

    fn on_update(&self, old: &Payload, new: &Payload) {
        match new {
            Payload::Node(node) => {
                if !matches!(old, Payload::Node(_)) {
                    warn!(
                        handler = "update",
                        old_kind = old.kind(),
                        node = node.name(),
                        "update replaced a non-node object"
                    );
                }
                if !old.eq_ignoring_status(new) {
                    self.update_node_weight(node);
                }
            }
            _ => unexpected("update", new),
        }
        self.forward(|next| next.on_update(old, new));
    }

    fn on_delete(&self, obj: &Payload) {
        self.delete_payload(obj);
        self.forward(|next| next.on_delete(obj));
    }
}

impl fmt::Debug for NodeWeightCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeWeightCache")
            .field("annotation", &self.annotation)
            .field("default_weight", &self.default_weight)
            .field("has_next", &self.next.is_some())
            .field("nodes", &self.len())
            .finish()
    }
}

fn lock(weights: &WeightTable) -> MutexGuard<'_, HashMap<NodeName, u32>> {
    weights.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lookup(weights: &WeightTable, node_name: &str, default_weight: u32) -> u32 {
    match lock(weights).get(node_name).copied() {
        None | Some(0) => default_weight,
        Some(weight) => weight,
    }
}

fn unexpected(handler: &'static str, obj: &Payload) {
    warn!(
        handler,
        kind = obj.kind(),
        name = obj.name(),
        "unexpected object type"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Recorder;
    use nodeweight_core::{DeletedFinalStateUnknown, NodeCondition, ObjectMeta, OtherResource, WatchEvent};

    const KEY: &str = "weight-annotation";

    fn make_node(name: &str, weight: &str) -> Payload {
        Payload::Node(Node::named(name).with_annotation(KEY, weight))
    }

    fn make_endpoints(name: &str, weight: &str) -> Payload {
        Payload::Other(OtherResource {
            kind: "Endpoints".to_string(),
            metadata: ObjectMeta::named(name).with_annotation(KEY, weight),
        })
    }

    /// Cache with `initial` already added, then chained to a fresh recorder.
    fn make_cache(default: u32, initial: &[Payload]) -> (NodeWeightCache, Arc<Recorder>) {
        let cache = NodeWeightCache::new(KEY, default);
        for obj in initial {
            cache.on_add(obj);
        }
        let recorder = Arc::new(Recorder::new());
        (cache.with_next(recorder.clone()), recorder)
    }

    #[test]
    fn weight_from_annotation() {
        let (cache, next) = make_cache(0, &[]);
        cache.on_add(&make_node("node1", "5"));

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("add"), 1);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn default_weight_for_unseen_node() {
        let (cache, next) = make_cache(1, &[]);
        assert_eq!(cache.weight_of_node(""), 1);
        assert_eq!(cache.weight_of_node("node1"), 1);
        assert!(next.is_empty());
    }

    #[test]
    fn update_weight_from_annotation() {
        let (cache, next) = make_cache(0, &[make_node("node1", "10")]);
        assert_eq!(cache.weight_of_node("node1"), 10);

        cache.on_update(&make_node("node1", "10"), &make_node("node1", "5"));

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("update"), 1);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn delete_weight_from_annotation() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);
        cache.on_delete(&make_node("node1", "5"));

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert!(cache.is_empty());
        assert_eq!(next.count("delete"), 1);
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn abnormal_weight_from_annotation() {
        let (cache, next) = make_cache(1, &[]);
        cache.on_add(&make_node("node1", "10000"));

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert_eq!(cache.snapshot()["node1"], 1);
        assert_eq!(next.count("add"), 1);
    }

    #[test]
    fn unparsable_weight_from_annotation() {
        let (cache, next) = make_cache(1, &[]);
        cache.on_add(&make_node("node1", "this will not parse as an int"));

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert_eq!(next.count("add"), 1);
    }

    #[test]
    fn annotation_not_found() {
        let (cache, next) = make_cache(1, &[]);
        let node = Node::named("node1").with_annotation("not a weight-annotation", "5");
        cache.on_add(&Payload::Node(node));

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert_eq!(next.count("add"), 1);
    }

    #[test]
    fn wrong_type_added() {
        let (cache, next) = make_cache(1, &[]);
        let obj = make_endpoints("node1", "10000");
        cache.on_add(&obj);

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert!(cache.is_empty());
        assert_eq!(next.events(), vec![WatchEvent::Added(obj)]);
    }

    #[test]
    fn wrong_old_type_updated() {
        let (cache, next) = make_cache(1, &[make_node("node1", "10")]);
        cache.on_update(&make_endpoints("node1", "15"), &make_node("node1", "5"));

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("update"), 1);
    }

    #[test]
    fn wrong_new_type_updated() {
        let (cache, next) = make_cache(0, &[make_node("node1", "5")]);
        let old = make_node("node1", "10");
        let new = make_endpoints("node1", "15");
        cache.on_update(&old, &new);

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.events(), vec![WatchEvent::Updated { old, new }]);
    }

    #[test]
    fn wrong_type_deleted() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);
        cache.on_delete(&make_endpoints("node1", "5"));

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("delete"), 1);
    }

    #[test]
    fn delete_final_state_unknown() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);
        let tombstone = Payload::Tombstone(DeletedFinalStateUnknown::new("node1", make_node("node1", "5")));
        cache.on_delete(&tombstone);

        assert_eq!(cache.weight_of_node("node1"), 1);
        assert!(cache.is_empty());
        // The wrapper itself is forwarded, exactly once.
        assert_eq!(next.events(), vec![WatchEvent::Deleted(tombstone)]);
    }

    #[test]
    fn nested_tombstone_within_limit_is_unwrapped() {
        let (cache, _next) = make_cache(1, &[make_node("node1", "5")]);
        let mut obj = make_node("node1", "5");
        for _ in 0..MAX_TOMBSTONE_DEPTH {
            obj = Payload::Tombstone(DeletedFinalStateUnknown::new("node1", obj));
        }
        cache.on_delete(&obj);
        assert!(cache.is_empty());
    }

    #[test]
    fn tombstone_nesting_past_limit_is_ignored() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);
        let mut obj = make_node("node1", "5");
        for _ in 0..=MAX_TOMBSTONE_DEPTH {
            obj = Payload::Tombstone(DeletedFinalStateUnknown::new("node1", obj));
        }
        cache.on_delete(&obj);

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("delete"), 1);
    }

    #[test]
    fn tombstone_around_other_kind_leaves_table() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);
        let tombstone = Payload::Tombstone(DeletedFinalStateUnknown::new("node1", make_endpoints("node1", "5")));
        cache.on_delete(&tombstone);

        assert_eq!(cache.weight_of_node("node1"), 5);
        assert_eq!(next.count("delete"), 1);
    }

    #[test]
    fn status_only_update_keeps_weight() {
        let (cache, next) = make_cache(1, &[make_node("node1", "5")]);

        // A write would reset the entry to 5.
        lock(&cache.weights).insert("node1".to_string(), 42);

        let old = Node::named("node1").with_annotation(KEY, "5");
        let mut new = old.clone();
        new.status.conditions.push(NodeCondition {
            condition_type: "Ready".to_string(),
            status: "True".to_string(),
            reason: None,
        });
        cache.on_update(&Payload::Node(old), &Payload::Node(new));

        assert_eq!(cache.weight_of_node("node1"), 42);
        assert_eq!(next.count("update"), 1);
    }

    #[test]
    fn update_creates_missing_entry() {
        let (cache, _next) = make_cache(1, &[]);
        cache.on_update(&make_node("node1", "10"), &make_node("node1", "20"));
        assert_eq!(cache.weight_of_node("node1"), 20);
    }

    #[test]
    fn add_is_idempotent() {
        let (cache, next) = make_cache(1, &[]);
        let obj = make_node("node1", "7");
        cache.on_add(&obj);
        let once = cache.snapshot();
        cache.on_add(&obj);

        assert_eq!(cache.snapshot(), once);
        assert_eq!(next.count("add"), 2);
    }

    #[test]
    fn add_overwrites_previous_value() {
        let (cache, _next) = make_cache(1, &[make_node("node1", "7")]);
        cache.on_add(&make_node("node1", "junk"));
        assert_eq!(cache.snapshot()["node1"], 1);
    }

    #[test]
    fn zero_weight_reads_as_default() {
        let (cache, _next) = make_cache(3, &[make_node("node1", "0")]);
        assert_eq!(cache.snapshot()["node1"], 0);
        assert_eq!(cache.weight_of_node("node1"), 3);
    }

    #[test]
    fn in_range_values_read_back() {
        let (cache, _next) = make_cache(1, &[]);
        for weight in 1..=128u32 {
            cache.on_add(&make_node("node1", &weight.to_string()));
            assert_eq!(cache.weight_of_node("node1"), weight);
        }
    }

    #[test]
    fn weight_func_sees_later_writes() {
        let (cache, _next) = make_cache(1, &[]);
        let weight_of = cache.weight_func();
        assert_eq!(weight_of("node1"), 1);

        cache.on_add(&make_node("node1", "9"));
        assert_eq!(weight_of("node1"), 9);

        cache.on_delete(&make_node("node1", "9"));
        assert_eq!(weight_of("node1"), 1);
    }

    #[test]
    fn no_next_handler_is_noop() {
        let cache = NodeWeightCache::new(KEY, 1);
        cache.on_add(&make_endpoints("x", "1"));
        cache.on_update(&make_node("node1", "1"), &make_node("node1", "2"));
        cache.on_delete(&make_node("node1", "2"));
        assert!(cache.is_empty());
    }

    #[test]
    fn out_of_range_default_is_replaced() {
        let (cache, _next) = make_cache(500, &[make_node("node1", "junk")]);
        assert_eq!(cache.default_weight(), DEFAULT_NODE_WEIGHT);
        assert_eq!(cache.snapshot()["node1"], DEFAULT_NODE_WEIGHT);
        assert_eq!(cache.weight_of_node("unseen"), DEFAULT_NODE_WEIGHT);

        let cache = NodeWeightCache::new(KEY, MAX_NODE_WEIGHT);
        assert_eq!(cache.default_weight(), MAX_NODE_WEIGHT);
    }

    #[test]
    fn from_config_uses_settings() {
        let cache = NodeWeightCache::from_config(&WeightConfig::new(KEY, 4));
        assert_eq!(cache.annotation(), KEY);
        assert_eq!(cache.default_weight(), 4);
        assert_eq!(cache.weight_of_node("node1"), 4);
    }
}
