//! Request-scoped domain models.
//!
//! Defines the inbound event shape, the outbound request descriptor handed to
//! the transport, the standardized classification result, and the per-event
//! batch result entries returned to the upstream scheduler.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::{is_truthy, PathExt};

/// Pipeline stage recorded on response classification results.
pub const STAGE_RESPONSE_TRANSFORM: &str = "response-transform";

/// Stat scope for failed classifications.
pub const SCOPE_EXCEPTION: &str = "exception";

/// Stat scope for successful destination API calls.
pub const SCOPE_API: &str = "api";

/// Retry-relevant outcome of a destination response.
///
/// Exactly one category applies per classified response. `Throttled` is
/// retried like `Retryable` downstream but kept separate for backoff tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeCategory {
    /// Destination accepted the request.
    Success,
    /// Transient failure, safe to retry.
    Retryable,
    /// Destination is rate limiting.
    Throttled,
    /// Permanent failure, drop the event.
    Abortable,
}

impl OutcomeCategory {
    /// Returns the wire name of the category.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Retryable => "retryable",
            Self::Throttled => "throttled",
            Self::Abortable => "abortable",
        }
    }

    /// Whether the scheduler should attempt the event again.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable | Self::Throttled)
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth failure sub-category, orthogonal to [`OutcomeCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorCategory {
    /// Not an OAuth failure.
    #[default]
    #[serde(rename = "")]
    None,
    /// Credentials are permanently invalid; stop sending.
    #[serde(rename = "DISABLE_DESTINATION")]
    DisableDestination,
    /// Token expired; refresh and retry.
    #[serde(rename = "REFRESH_TOKEN")]
    RefreshToken,
}

impl AuthErrorCategory {
    /// Whether this is an actual OAuth failure class.
    pub const fn is_auth_failure(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Observability metadata attached to a classification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTags {
    /// Destination name.
    pub destination: String,
    /// Pipeline stage.
    pub stage: String,
    /// Measurement scope.
    pub scope: String,
    /// Outcome category driving retry policy.
    pub meta: OutcomeCategory,
}

impl StatTags {
    /// Tags for a failed response transform.
    pub fn exception(destination: impl Into<String>, meta: OutcomeCategory) -> Self {
        Self {
            destination: destination.into(),
            stage: STAGE_RESPONSE_TRANSFORM.to_string(),
            scope: SCOPE_EXCEPTION.to_string(),
            meta,
        }
    }

    /// Tags for a successful destination API call.
    pub fn api(destination: impl Into<String>, meta: OutcomeCategory) -> Self {
        Self {
            destination: destination.into(),
            stage: STAGE_RESPONSE_TRANSFORM.to_string(),
            scope: SCOPE_API.to_string(),
            meta,
        }
    }
}

/// Standardized outcome of handling one destination response.
///
/// Immutable once built. `is_failure` is derived from `status` by the
/// builder: it is `false` exactly when the status is in `200..=299`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizedResult {
    status: u16,
    message: String,
    auth_error_category: AuthErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    stat_tags: StatTags,
    is_failure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_response: Option<Value>,
}

impl StandardizedResult {
    /// Starts a result with the two fields every result needs.
    pub fn builder(status: u16, stat_tags: StatTags) -> StandardizedResultBuilder {
        StandardizedResultBuilder {
            status,
            stat_tags,
            message: String::new(),
            auth_error_category: AuthErrorCategory::None,
            access_token: None,
            destination_response: None,
        }
    }

    /// HTTP-equivalent status.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// OAuth failure sub-category.
    pub fn auth_error_category(&self) -> AuthErrorCategory {
        self.auth_error_category
    }

    /// Access token taken from the outbound request, for token refresh.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Classification metadata.
    pub fn stat_tags(&self) -> &StatTags {
        &self.stat_tags
    }

    /// Whether the status falls outside the success range.
    pub fn is_failure(&self) -> bool {
        self.is_failure
    }

    /// The destination's raw response body, when attached.
    pub fn destination_response(&self) -> Option<&Value> {
        self.destination_response.as_ref()
    }

    /// Returns a copy carrying the given raw destination response.
    #[must_use]
    pub fn with_destination_response(mut self, response: Value) -> Self {
        self.destination_response = Some(response);
        self
    }
}

/// Builder for [`StandardizedResult`].
#[derive(Debug, Clone)]
pub struct StandardizedResultBuilder {
    status: u16,
    stat_tags: StatTags,
    message: String,
    auth_error_category: AuthErrorCategory,
    access_token: Option<String>,
    destination_response: Option<Value>,
}

impl StandardizedResultBuilder {
    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the OAuth failure sub-category.
    #[must_use]
    pub fn auth_error_category(mut self, category: AuthErrorCategory) -> Self {
        self.auth_error_category = category;
        self
    }

    /// Sets the access token extracted from the outbound request.
    #[must_use]
    pub fn access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Attaches the destination's raw response.
    #[must_use]
    pub fn destination_response(mut self, response: Value) -> Self {
        self.destination_response = Some(response);
        self
    }

    /// Finalizes the result, deriving `is_failure` from the status.
    pub fn build(self) -> StandardizedResult {
        StandardizedResult {
            is_failure: !(200..=299).contains(&self.status),
            status: self.status,
            message: self.message,
            auth_error_category: self.auth_error_category,
            access_token: self.access_token,
            stat_tags: self.stat_tags,
            destination_response: self.destination_response,
        }
    }
}

/// Destination definition carried on every inbound event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Destination-specific settings (credentials, region flags).
    #[serde(rename = "Config", default)]
    pub config: Value,
    /// Remaining destination fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Destination {
    /// Returns a non-empty string setting.
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.str_at(key).filter(|value| !value.is_empty())
    }

    /// Returns a flag setting, treating absent values as `false`.
    pub fn config_flag(&self, key: &str) -> bool {
        self.config.at_path(key).is_some_and(is_truthy)
    }
}

/// One generic analytics event addressed to a destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// The event payload; carries at least `type`.
    #[serde(default)]
    pub message: Value,
    /// Destination the event is routed to.
    #[serde(default)]
    pub destination: Destination,
    /// Opaque per-event correlation token.
    #[serde(default)]
    pub metadata: Value,
}

impl InputEvent {
    /// Returns the raw `message.type`, if present and a string.
    pub fn message_type(&self) -> Option<&str> {
        self.message.str_at("type").filter(|kind| !kind.is_empty())
    }

    /// Whether an earlier stage already produced this event's output.
    ///
    /// Such events carry their own `statusCode` and pass through unchanged.
    pub fn is_transformed(&self) -> bool {
        self.message.at_path("statusCode").is_some_and(is_truthy)
    }
}

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl HttpMethod {
    /// Returns the method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body variants of an outbound request. Only one is populated per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// JSON object body.
    #[serde(rename = "JSON", default)]
    pub json: Map<String, Value>,
    /// JSON array body.
    #[serde(rename = "JSON_ARRAY", default)]
    pub json_array: Map<String, Value>,
    /// XML body.
    #[serde(rename = "XML", default)]
    pub xml: Map<String, Value>,
    /// Form-encoded body.
    #[serde(rename = "FORM", default)]
    pub form: Map<String, Value>,
}

/// Outbound request built by an event processor for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// Descriptor format version.
    pub version: String,
    /// Request kind; always `REST`.
    #[serde(rename = "type")]
    pub kind: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute endpoint URL.
    pub endpoint: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Query parameters.
    pub params: Map<String, Value>,
    /// Request body.
    pub body: RequestBody,
    /// File attachments.
    pub files: Map<String, Value>,
}

impl RequestDescriptor {
    /// Creates an empty REST request for `endpoint`.
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            version: "1".to_string(),
            kind: "REST".to_string(),
            method,
            endpoint: endpoint.into(),
            headers: BTreeMap::new(),
            params: Map::new(),
            body: RequestBody::default(),
            files: Map::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON object body.
    #[must_use]
    pub fn with_json(mut self, body: Map<String, Value>) -> Self {
        self.body.json = body;
        self
    }
}

/// Output carried by a successful batch entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchOutput {
    /// Request freshly built by the event processor.
    Request(RequestDescriptor),
    /// Already-transformed message passed through unchanged.
    Passthrough(Value),
}

/// Successful batch entry.
///
/// Serialized as `{batchedRequest, metadata, batched, statusCode,
/// destination}`, the router's success-entry shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSuccess {
    /// Built request or passed-through message.
    #[serde(rename = "batchedRequest")]
    pub output: BatchOutput,
    /// Correlation tokens of the events this entry covers.
    pub metadata: Vec<Value>,
    /// Whether several events were merged into this entry.
    pub batched: bool,
    /// Always 200.
    pub status_code: u16,
    /// Destination the entry is addressed to.
    pub destination: Destination,
}

/// Failed batch entry.
///
/// Serialized as `{metadata, batched, statusCode, error}`, the router's
/// error-entry shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    /// Correlation tokens, or `None` when the batch itself was invalid.
    pub metadata: Option<Vec<Value>>,
    /// Whether several events were merged into this entry.
    pub batched: bool,
    /// HTTP-equivalent status of the failure.
    pub status_code: u16,
    /// Failure description.
    #[serde(rename = "error")]
    pub message: String,
}

/// One entry of the reconciled batch, aligned with its input event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchResult {
    /// Event processed or passed through.
    Success(BatchSuccess),
    /// Event failed; carries the extracted status and message.
    Error(BatchError),
}

impl BatchResult {
    /// Wraps a successful output.
    pub fn success(output: BatchOutput, metadata: Vec<Value>, destination: Destination) -> Self {
        Self::Success(BatchSuccess {
            output,
            metadata,
            batched: false,
            status_code: 200,
            destination,
        })
    }

    /// Wraps a failure.
    pub fn error(
        metadata: Option<Vec<Value>>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Error(BatchError { metadata, batched: false, status_code, message: message.into() })
    }

    /// Whether this entry is a success wrapper.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// HTTP-equivalent status of the entry.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success(success) => success.status_code,
            Self::Error(error) => error.status_code,
        }
    }

    /// Correlation tokens carried by the entry.
    pub fn metadata(&self) -> Option<&[Value]> {
        match self {
            Self::Success(success) => Some(&success.metadata),
            Self::Error(error) => error.metadata.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failure_flag_follows_status_range() {
        let tags = StatTags::api("bqstream", OutcomeCategory::Success);
        assert!(!StandardizedResult::builder(200, tags.clone()).build().is_failure());
        assert!(!StandardizedResult::builder(299, tags.clone()).build().is_failure());
        assert!(StandardizedResult::builder(199, tags.clone()).build().is_failure());
        assert!(StandardizedResult::builder(300, tags.clone()).build().is_failure());
        assert!(StandardizedResult::builder(500, tags).build().is_failure());
    }

    #[test]
    fn auth_category_wire_names() {
        assert_eq!(serde_json::to_value(AuthErrorCategory::None).unwrap(), json!(""));
        assert_eq!(
            serde_json::to_value(AuthErrorCategory::DisableDestination).unwrap(),
            json!("DISABLE_DESTINATION")
        );
        assert_eq!(
            serde_json::to_value(AuthErrorCategory::RefreshToken).unwrap(),
            json!("REFRESH_TOKEN")
        );
    }

    #[test]
    fn outcome_retryability() {
        assert!(OutcomeCategory::Retryable.is_retryable());
        assert!(OutcomeCategory::Throttled.is_retryable());
        assert!(!OutcomeCategory::Abortable.is_retryable());
        assert!(!OutcomeCategory::Success.is_retryable());
    }

    #[test]
    fn transformed_marker_requires_truthy_status_code() {
        let mut event = InputEvent { message: json!({"type": "track"}), ..Default::default() };
        assert!(!event.is_transformed());

        event.message = json!({"type": "track", "statusCode": 0});
        assert!(!event.is_transformed());

        event.message = json!({"type": "track", "statusCode": 200});
        assert!(event.is_transformed());
    }

    #[test]
    fn destination_config_accessors() {
        let destination: Destination = serde_json::from_value(json!({
            "Config": {"usersApiKey": "key", "eventApiKey": "", "datacenterEU": true},
            "ID": "dest-1"
        }))
        .unwrap();

        assert_eq!(destination.config_str("usersApiKey"), Some("key"));
        assert_eq!(destination.config_str("eventApiKey"), None);
        assert!(destination.config_flag("datacenterEU"));
        assert!(!destination.config_flag("missing"));
        assert_eq!(destination.extra.get("ID"), Some(&json!("dest-1")));
    }

    #[test]
    fn message_type_ignores_empty_and_non_string() {
        let event = InputEvent { message: json!({"type": ""}), ..Default::default() };
        assert_eq!(event.message_type(), None);

        let event = InputEvent { message: json!({"type": 7}), ..Default::default() };
        assert_eq!(event.message_type(), None);
    }
}
