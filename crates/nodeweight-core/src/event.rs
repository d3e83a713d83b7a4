//! JSON-lines codec for recorded cluster event streams.
//!
//! Each line is one event:
//!
//! ```text
//! {"type":"add","object":{"kind":"Node","metadata":{"name":"node1"}}}
//! {"type":"update","old":{...},"new":{...}}
//! {"type":"delete","object":{"kind":"DeletedFinalStateUnknown","key":"node1","obj":{...}}}
//! ```
//!
//! Objects are classified by their `kind` field. Kinds other than `Node`
//! and the tombstone decode to [`Payload::Other`] so they still flow
//! through the pipeline.

use serde_json::Value;

use crate::error::{EventError, EventResult};
use crate::types::*;

/// One callback from the cluster event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Added(Payload),
    Updated { old: Payload, new: Payload },
    Deleted(Payload),
}

impl WatchEvent {
    /// Short name of the callback this event maps to.
    pub fn event_type(&self) -> &'static str {
        match self {
            WatchEvent::Added(_) => "add",
            WatchEvent::Updated { .. } => "update",
            WatchEvent::Deleted(_) => "delete",
        }
    }

    /// Decode a single JSON line.
    pub fn from_json(line: &str) -> EventResult<Self> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> EventResult<Self> {
        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EventError::MissingField("type"))?
            .to_string();

        match event_type.as_str() {
            "add" => Ok(WatchEvent::Added(take_payload(&mut value, "object")?)),
            "update" => Ok(WatchEvent::Updated {
                old: take_payload(&mut value, "old")?,
                new: take_payload(&mut value, "new")?,
            }),
            "delete" => Ok(WatchEvent::Deleted(take_payload(&mut value, "object")?)),
            _ => Err(EventError::UnknownEventType(event_type)),
        }
    }
}

fn take_payload(value: &mut Value, field: &'static str) -> EventResult<Payload> {
    let object = value
        .get_mut(field)
        .map(Value::take)
        .ok_or(EventError::MissingField(field))?;
    decode_payload(object)
}

/// Classify a JSON object by `kind` and decode it into a [`Payload`].
pub fn decode_payload(mut object: Value) -> EventResult<Payload> {
    let kind = object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(EventError::MissingKind)?
        .to_string();

    match kind.as_str() {
        NODE_KIND => serde_json::from_value::<Node>(object)
            .map(Payload::Node)
            .map_err(|e| decode_error(&kind, e)),
        TOMBSTONE_KIND => {
            let key = object
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let inner = take_payload(&mut object, "obj")?;
            Ok(Payload::Tombstone(DeletedFinalStateUnknown::new(key, inner)))
        }
        _ => {
            // Metadata of foreign kinds is informational only.
            let metadata = object
                .get_mut("metadata")
                .map(Value::take)
                .and_then(|m| serde_json::from_value::<ObjectMeta>(m).ok())
                .unwrap_or_default();
            Ok(Payload::Other(OtherResource { kind, metadata }))
        }
    }
}

fn decode_error(kind: &str, err: serde_json::Error) -> EventError {
    EventError::Decode {
        kind: kind.to_string(),
        reason: err.to_string(),
    }
}
