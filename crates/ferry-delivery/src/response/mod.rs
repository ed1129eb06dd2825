//! Destination response handling.
//!
//! A [`ResponseHandler`] turns a destination's raw body into a
//! [`StandardizedResult`], or fails with a [`DestinationError`] carrying the
//! same shape. [`parse_dest_response`] validates the proxy payload that
//! wraps the body before any destination-specific rule runs.

use std::fmt;

use ferry_core::{DestinationError, PathExt, StandardizedResult, StatTags};
use serde_json::Value;

use crate::classify::OutcomeClassifier;

pub mod bqstream;

pub use bqstream::BqStreamHandler;

/// Destination-specific response classification.
pub trait ResponseHandler: Send + Sync + fmt::Debug {
    /// Destination name used in stat tags.
    fn destination(&self) -> &'static str;

    /// Retry policy applied to every failure this handler reports.
    fn classifier(&self) -> &OutcomeClassifier;

    /// Classifies a parsed destination body.
    ///
    /// # Errors
    ///
    /// Returns a [`DestinationError`] whenever the body indicates anything
    /// other than unambiguous success.
    fn handle(
        &self,
        body: &Value,
        access_token: Option<&str>,
    ) -> Result<StandardizedResult, DestinationError>;

    /// Validates a proxy payload, then classifies its body.
    ///
    /// The access token is taken from the `Authorization` header of the
    /// original outbound request so a refresh flow can act on it. Both
    /// outcomes carry the parsed destination body.
    ///
    /// # Errors
    ///
    /// Returns a 400 [`DestinationError`] for malformed proxy payloads, and
    /// whatever [`ResponseHandler::handle`] returns otherwise.
    fn response_transform(&self, proxy: &Value) -> Result<StandardizedResult, DestinationError> {
        let parsed = parse_dest_response_with(proxy, self.destination(), self.classifier())?;
        let access_token = access_token_from_request(&parsed.payload);

        match self.handle(&parsed.response_body, access_token.as_deref()) {
            Ok(result) => Ok(result.with_destination_response(parsed.response_body)),
            Err(error) => Err(error.with_destination_response(parsed.response_body)),
        }
    }
}

/// Proxy payload after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDestResponse {
    /// Destination body, JSON-decoded when it arrived as a JSON string.
    pub response_body: Value,
    /// HTTP status the destination answered with.
    pub status: u16,
    /// The outbound request that produced the response.
    pub payload: Value,
}

/// Validates a proxy payload of shape `{responseBody, status, payload}`
/// under the default retry policy.
///
/// # Errors
///
/// See [`parse_dest_response_with`].
pub fn parse_dest_response(
    proxy: &Value,
    destination: &str,
) -> Result<ParsedDestResponse, DestinationError> {
    parse_dest_response_with(proxy, destination, &OutcomeClassifier::default())
}

/// Validates a proxy payload of shape `{responseBody, status, payload}`.
///
/// String bodies are JSON-decoded when possible and kept verbatim
/// otherwise, so an empty body stays the empty string.
///
/// # Errors
///
/// Returns a 400 [`DestinationError`] when the payload is not a non-empty
/// object, or when `responseBody` is missing or `status` is missing,
/// non-numeric, or zero.
pub fn parse_dest_response_with(
    proxy: &Value,
    destination: &str,
    classifier: &OutcomeClassifier,
) -> Result<ParsedDestResponse, DestinationError> {
    let invalid = |message: String| -> DestinationError {
        StandardizedResult::builder(400, StatTags::exception(destination, classifier.classify(400)))
            .message(message)
            .destination_response(proxy.clone())
            .build()
            .into()
    };

    let Some(object) = proxy.as_object().filter(|object| !object.is_empty()) else {
        return Err(invalid(format!(
            "[ResponseTransform]: Destination Response Invalid, for destination: {destination}"
        )));
    };

    let body = object.get("responseBody").filter(|body| !body.is_null());
    let status = object
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|status| u16::try_from(status).ok())
        .filter(|status| *status != 0);

    let (Some(body), Some(status)) = (body, status) else {
        return Err(invalid(format!(
            "[ResponseTransform]: Destination Response Body and(or) Status Invalid, for destination: {destination}"
        )));
    };

    Ok(ParsedDestResponse {
        response_body: decode_body(body),
        status,
        payload: object.get("payload").cloned().unwrap_or(Value::Null),
    })
}

fn decode_body(body: &Value) -> Value {
    match body {
        Value::String(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        },
        other => other.clone(),
    }
}

/// Extracts the token from an `Authorization: <scheme> <token>` header.
pub fn access_token_from_request(payload: &Value) -> Option<String> {
    payload
        .first_at(&["headers.Authorization", "headers.authorization"])
        .and_then(Value::as_str)
        .and_then(|header| header.split_whitespace().nth(1))
        .map(str::to_string)
}
