//! Annotation → weight resolution.

use std::collections::HashMap;

use nodeweight_core::MAX_NODE_WEIGHT;

/// Resolve a node weight from its annotations.
///
/// The value under `key` must be a base-10 integer that fits in a `u32`;
/// anything else (including a missing key) yields `default`. The parsed
/// value then goes through [`normalize_weight`].
pub fn resolve_node_weight(annotations: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    let weight = annotations
        .get(key)
        .and_then(|value| parse_weight(value))
        .unwrap_or(default);

    normalize_weight(weight, default)
}

/// Collapse weights above [`MAX_NODE_WEIGHT`] to the default.
pub fn normalize_weight(weight: u32, default: u32) -> u32 {
    if weight > MAX_NODE_WEIGHT {
        default
    } else {
        weight
    }
}

// `u32::from_str` accepts a leading '+', which the annotation format does not.
fn parse_weight(value: &str) -> Option<u32> {
    if value.starts_with('+') {
        return None;
    }
    value.parse::<u32>().ok()
}
