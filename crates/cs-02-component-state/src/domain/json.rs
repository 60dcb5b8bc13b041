//! JSON conventions of the page state blob.
//!
//! Member keys are camelCase, nulls are omitted on write, and member lookup
//! on read is case-insensitive. Child nodes are keys prefixed with
//! [`CHILD_NODE_PREFIX`].

use serde_json::{Map, Value};

pub const CHILD_NODE_PREFIX: &str = "n__";

/// `count` → `count`, `Count` → `count`, `max_items` → `maxItems`.
pub fn to_camel_case(name: &str) -> String {
    let mut camel = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.trim_start_matches('_').chars() {
        if ch == '_' {
            upper_next = !camel.is_empty();
        } else if camel.is_empty() {
            camel.extend(ch.to_lowercase());
        } else if upper_next {
            camel.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            camel.push(ch);
        }
    }
    camel
}

/// Exact match first, then ASCII case-insensitive.
pub fn find_property<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}
