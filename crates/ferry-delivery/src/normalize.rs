//! Shape-tolerant normalization of raw transport responses.
//!
//! Each output field is read through an independent optional path lookup,
//! so a missing `response`, a missing `data`, or a completely malformed
//! input simply leaves the corresponding fields empty.

use ferry_core::PathExt;
use serde::Serialize;
use serde_json::{Map, Value};

/// Error code reported by a transport or destination: text or numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseCode {
    /// Numeric code.
    Number(i64),
    /// Text code such as `ECONNREFUSED` or `PERMISSION_DENIED`.
    Text(String),
}

impl ResponseCode {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(number) => number.as_i64().map(Self::Number),
            _ => None,
        }
    }

    /// Returns the text form of a text code.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

/// Uniform view over a raw transport response. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    /// Transport or destination error code.
    pub code: Option<ResponseCode>,
    /// HTTP status.
    pub status: Option<u16>,
    /// HTTP reason phrase.
    pub status_text: Option<String>,
    /// Response headers.
    pub headers: Option<Map<String, Value>>,
    /// Response body.
    pub data: Option<Value>,
    /// Transport-level success flag.
    pub success: Option<bool>,
}

/// Where each normalized field lives inside a raw response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePaths {
    /// Path of the error code.
    pub code: &'static str,
    /// Path of the HTTP status.
    pub status: &'static str,
    /// Path of the reason phrase.
    pub status_text: &'static str,
    /// Path of the headers map.
    pub headers: &'static str,
    /// Path of the body.
    pub data: &'static str,
    /// Path of the success flag.
    pub success: &'static str,
}

impl ResponsePaths {
    /// Layout produced by [`crate::transport::HttpTransport`].
    pub const TRANSPORT: Self = Self {
        code: "response.code",
        status: "response.status",
        status_text: "response.statusText",
        headers: "response.headers",
        data: "response.data",
        success: "success",
    };

    /// Layout of Google API client errors, wrapped one level deeper. The code
    /// is the Google status string (e.g. `PERMISSION_DENIED`).
    pub const GOOGLE: Self = Self {
        code: "response.response.data.error.status",
        status: "response.response.status",
        status_text: "response.response.statusText",
        headers: "response.response.headers",
        data: "response.response.data",
        success: "success",
    };
}

impl Default for ResponsePaths {
    fn default() -> Self {
        Self::TRANSPORT
    }
}

/// Normalizes a raw response using the transport layout.
pub fn normalize(raw: &Value) -> NormalizedResponse {
    normalize_with(raw, &ResponsePaths::TRANSPORT)
}

/// Normalizes a raw response using a caller-supplied layout.
pub fn normalize_with(raw: &Value, paths: &ResponsePaths) -> NormalizedResponse {
    NormalizedResponse {
        code: raw.at_path(paths.code).and_then(ResponseCode::from_value),
        status: raw
            .at_path(paths.status)
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok()),
        status_text: raw.str_at(paths.status_text).map(str::to_string),
        headers: raw.at_path(paths.headers).and_then(Value::as_object).cloned(),
        data: raw.at_path(paths.data).cloned(),
        success: raw.at_path(paths.success).and_then(Value::as_bool),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_transport_layout() {
        let raw = json!({
            "success": false,
            "response": {
                "code": "ECONNREFUSED",
                "status": 503,
                "statusText": "Service Unavailable",
                "headers": {"retry-after": "5"},
                "data": {"message": "down"}
            }
        });

        let normalized = normalize(&raw);
        assert_eq!(normalized.code, Some(ResponseCode::Text("ECONNREFUSED".to_string())));
        assert_eq!(normalized.status, Some(503));
        assert_eq!(normalized.status_text.as_deref(), Some("Service Unavailable"));
        assert_eq!(normalized.headers.unwrap().get("retry-after"), Some(&json!("5")));
        assert_eq!(normalized.data, Some(json!({"message": "down"})));
        assert_eq!(normalized.success, Some(false));
    }

    #[test]
    fn missing_everything_is_empty() {
        assert_eq!(normalize(&Value::Null), NormalizedResponse::default());
        assert_eq!(normalize(&json!("text")), NormalizedResponse::default());
        assert_eq!(normalize(&json!({"response": null})), NormalizedResponse::default());
    }

    #[test]
    fn wrong_typed_fields_are_dropped() {
        let raw = json!({"response": {"status": "500", "headers": [], "code": true}});
        let normalized = normalize(&raw);
        assert_eq!(normalized.status, None);
        assert_eq!(normalized.headers, None);
        assert_eq!(normalized.code, None);
    }

    #[test]
    fn out_of_range_status_is_dropped() {
        let raw = json!({"response": {"status": 70000}});
        assert_eq!(normalize(&raw).status, None);
    }

    #[test]
    fn numeric_code_kept() {
        let raw = json!({"response": {"code": 403}});
        assert_eq!(normalize(&raw).code, Some(ResponseCode::Number(403)));
    }

    #[test]
    fn google_layout_reads_nested_status() {
        let raw = json!({
            "response": {"response": {
                "status": 403,
                "data": {"error": {"status": "PERMISSION_DENIED"}}
            }}
        });

        let normalized = normalize_with(&raw, &ResponsePaths::GOOGLE);
        assert_eq!(normalized.status, Some(403));
        assert_eq!(
            normalized.code.as_ref().and_then(ResponseCode::as_text),
            Some("PERMISSION_DENIED")
        );
    }
}
