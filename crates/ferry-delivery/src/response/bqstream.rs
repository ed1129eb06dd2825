//! BigQuery streaming-insert response handling.
//!
//! Only OAuth failures get special treatment: a permission failure disables
//! the destination and an authentication failure requests a token refresh.
//! Both are reported as 500 so the auth flow, not plain 4xx handling,
//! decides what happens next.
//!
//! Error references:
//! - <https://cloud.google.com/apigee/docs/api-platform/reference/policies/oauth-http-status-code-reference>
//! - <https://cloud.google.com/bigquery/docs/error-messages>

use ferry_core::{
    path::is_truthy, AuthErrorCategory, DestinationError, OutcomeCategory, PathExt,
    StandardizedResult, StatTags,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::ResponseHandler;
use crate::{
    classify::{oauth_error_category, OutcomeClassifier},
    normalize::{normalize_with, ResponsePaths},
};

/// Destination name.
pub const DESTINATION: &str = "bqstream";

const DEFAULT_ERROR_MESSAGE: &str = "BQStream request failed";

/// Response handler for the BigQuery `insertAll` API.
#[derive(Debug, Clone, Default)]
pub struct BqStreamHandler {
    classifier: OutcomeClassifier,
}

impl BqStreamHandler {
    /// Creates a handler that classifies failures with `classifier`.
    pub fn new(classifier: OutcomeClassifier) -> Self {
        Self { classifier }
    }

    fn failure(
        &self,
        status: u16,
        message: &str,
        auth_error_category: AuthErrorCategory,
        access_token: Option<&str>,
        meta: OutcomeCategory,
    ) -> DestinationError {
        warn!(
            destination = DESTINATION,
            status,
            auth_error_category = ?auth_error_category,
            meta = %meta,
            "destination rejected request: {message}"
        );

        StandardizedResult::builder(status, StatTags::exception(DESTINATION, meta))
            .message(message)
            .auth_error_category(auth_error_category)
            .access_token(access_token.map(str::to_string))
            .build()
            .into()
    }
}

impl ResponseHandler for BqStreamHandler {
    fn destination(&self) -> &'static str {
        DESTINATION
    }

    fn classifier(&self) -> &OutcomeClassifier {
        &self.classifier
    }

    fn handle(
        &self,
        body: &Value,
        access_token: Option<&str>,
    ) -> Result<StandardizedResult, DestinationError> {
        let error = body.at_path("error").filter(|error| is_truthy(error));
        let insert_errors = body.at_path("insertErrors").filter(|errors| is_truthy(errors));
        let no_insert_errors =
            insert_errors.map_or(true, |errors| errors.as_array().is_some_and(Vec::is_empty));

        if error.is_none() && no_insert_errors {
            debug!(destination = DESTINATION, "insert accepted");
            return Ok(StandardizedResult::builder(
                200,
                StatTags::api(DESTINATION, OutcomeCategory::Success),
            )
            .message("Request Processed successfully")
            .build());
        }

        if let Some(error) = error {
            let auth_error_category =
                oauth_error_category(error.str_at("status").unwrap_or_default());
            let status = if auth_error_category.is_auth_failure() { 500 } else { 400 };
            let message = error
                .str_at("message")
                .filter(|message| !message.is_empty())
                .unwrap_or(DEFAULT_ERROR_MESSAGE);

            return Err(self.failure(
                status,
                message,
                auth_error_category,
                access_token,
                self.classifier.classify(status),
            ));
        }

        if insert_errors.and_then(Value::as_array).is_some_and(|errors| !errors.is_empty()) {
            let recovered = normalize_with(body, &ResponsePaths::GOOGLE).status.unwrap_or(400);
            return Err(self.failure(
                400,
                "Problem during insert operation",
                AuthErrorCategory::None,
                access_token,
                self.classifier.classify(recovered),
            ));
        }

        Err(self.failure(
            400,
            "Unhandled error type while sending to destination",
            AuthErrorCategory::None,
            access_token,
            OutcomeCategory::Abortable,
        ))
    }
}
