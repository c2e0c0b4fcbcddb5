// src/ingest/extract.rs
use serde_json::{Map, Value};

use crate::ingest::types::RawPost;

/// Listing entries of this kind are posts (links or self-posts).
pub const POST_KIND: &str = "t3";

/// Flatten an accepted payload into raw posts.
///
/// Shapes understood:
/// - `{data: {children: [...]}}`: a listing; `t3` children are kept.
/// - `{data: {...}}` without `children`: a single post.
/// - `[{data: {children: [...]}}, ...]`: several listings, flattened in order.
///
/// Malformed entries are skipped, never fatal.
pub fn extract_posts(payload: Value) -> Vec<RawPost> {
    let mut posts = Vec::new();
    match payload {
        Value::Object(mut obj) => {
            if let Some(Value::Object(mut data)) = obj.remove("data") {
                match data.remove("children") {
                    Some(children) => collect_children(children, &mut posts),
                    None => posts.push(RawPost::from(data)),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let Some(children) = listing_children(item) {
                    collect_children(children, &mut posts);
                }
            }
        }
        _ => {}
    }
    posts
}

fn listing_children(item: Value) -> Option<Value> {
    let Value::Object(mut obj) = item else {
        return None;
    };
    let Some(Value::Object(mut data)) = obj.remove("data") else {
        return None;
    };
    data.remove("children")
}

fn collect_children(children: Value, out: &mut Vec<RawPost>) {
    let Value::Array(children) = children else {
        return;
    };
    for child in children {
        if let Some(fields) = post_fields(child) {
            out.push(RawPost::from(fields));
        }
    }
}

fn post_fields(child: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut child) = child else {
        return None;
    };
    if child.get("kind").and_then(Value::as_str) != Some(POST_KIND) {
        return None;
    }
    match child.remove("data") {
        Some(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}
