//! Optional path lookups over loosely-shaped JSON trees.
//!
//! Destination transports nest the fields we care about at different depths,
//! and any intermediate segment may be missing or `null`. Lookups here never
//! panic: a missing segment yields `None`.

use serde_json::Value;

/// Dotted-path access into a [`Value`] tree.
///
/// Object segments are matched by key; array segments must parse as an
/// index. A `null` anywhere along the path, including the final value, is
/// reported as absent.
///
/// # Example
///
/// ```
/// use ferry_core::PathExt;
/// use serde_json::json;
///
/// let raw = json!({"response": {"status": 503, "data": null}});
/// assert_eq!(raw.at_path("response.status"), Some(&json!(503)));
/// assert_eq!(raw.at_path("response.data"), None);
/// assert_eq!(raw.at_path("response.headers.etag"), None);
/// ```
pub trait PathExt {
    /// Returns the value at `path`, or `None` when any segment is absent.
    fn at_path(&self, path: &str) -> Option<&Value>;

    /// Returns the first present value among `paths`.
    fn first_at(&self, paths: &[&str]) -> Option<&Value> {
        paths.iter().find_map(|path| self.at_path(path))
    }

    /// Returns the string at `path`, if the value there is a string.
    fn str_at(&self, path: &str) -> Option<&str> {
        self.at_path(path).and_then(Value::as_str)
    }
}

impl PathExt for Value {
    fn at_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return non_null(self);
        }

        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        non_null(current)
    }
}

impl PathExt for Option<&Value> {
    fn at_path(&self, path: &str) -> Option<&Value> {
        self.and_then(|value| value.at_path(path))
    }
}

fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

/// Reports whether a value counts as "set" for flag-style fields.
///
/// `null`, `false`, `0`, and the empty string are unset. Everything else,
/// including empty objects and arrays, is set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
