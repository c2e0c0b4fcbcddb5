// src/ingest/validate.rs
use serde_json::Value;

/// Accept only payloads that carry at least one listing entry.
///
/// An object needs a non-empty `data.children` array. An array (the shape a
/// post permalink returns: post listing followed by comment listing) passes
/// when any of its elements does.
pub fn is_valid_listing(payload: &Value) -> bool {
    match payload {
        Value::Object(_) => has_children(payload),
        Value::Array(items) => items.iter().any(has_children),
        _ => false,
    }
}

fn has_children(v: &Value) -> bool {
    v.get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .is_some_and(|children| !children.is_empty())
}
