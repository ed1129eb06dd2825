//! Declarative field mapping from generic events to destination payloads.

use ferry_core::PathExt;
use serde_json::{Map, Value};

/// One destination field and where to read it from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingField {
    /// Key in the destination payload.
    pub dest_key: &'static str,
    /// Event paths tried in order; the first present value wins.
    pub source_keys: &'static [&'static str],
    /// Whether the payload is unusable without this field.
    pub required: bool,
}

impl MappingField {
    /// Optional field.
    pub const fn optional(dest_key: &'static str, source_keys: &'static [&'static str]) -> Self {
        Self { dest_key, source_keys, required: false }
    }

    /// Required field.
    pub const fn required(dest_key: &'static str, source_keys: &'static [&'static str]) -> Self {
        Self { dest_key, source_keys, required: true }
    }
}

/// Builds a payload from `message` according to `fields`.
///
/// Returns `None` when a required field is absent, which signals a mapping
/// configuration problem rather than a transient fault.
pub fn construct_payload(message: &Value, fields: &[MappingField]) -> Option<Map<String, Value>> {
    let mut payload = Map::new();
    for field in fields {
        match message.first_at(field.source_keys) {
            Some(value) => {
                payload.insert(field.dest_key.to_string(), value.clone());
            },
            None if field.required => return None,
            None => {},
        }
    }
    Some(payload)
}

/// Copies unmapped keys from the objects at `roots` into `payload`.
///
/// Keys already in the payload and keys in `exclusions` are left alone.
/// A source key mapped under a different destination name is copied again
/// unless it is excluded. Earlier roots win over later ones.
pub fn extract_custom_fields(
    message: &Value,
    mut payload: Map<String, Value>,
    roots: &[&str],
    exclusions: &[&str],
) -> Map<String, Value> {
    for root in roots {
        let Some(object) = message.at_path(root).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in object {
            if exclusions.contains(&key.as_str()) || payload.contains_key(key) {
                continue;
            }
            payload.insert(key.clone(), value.clone());
        }
    }
    payload
}
