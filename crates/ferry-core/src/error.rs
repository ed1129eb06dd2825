//! Structured error taxonomy for event transformation and response handling.
//!
//! Every failure raised by an event processor or a response handler is one
//! of these variants. None of them is string-only: each carries enough
//! structure for the batch reconciler to extract an HTTP-equivalent status
//! without inspecting messages.

use thiserror::Error;

use crate::models::{AuthErrorCategory, StandardizedResult, StatTags};

/// Result type alias using [`TransformError`].
pub type Result<T> = std::result::Result<T, TransformError>;

/// Destination rejected or failed a request.
///
/// Carries the full [`StandardizedResult`] so callers see the same shape
/// whether the response handler succeeded or failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .result.message())]
pub struct DestinationError {
    result: Box<StandardizedResult>,
}

impl DestinationError {
    /// Wraps a failed result.
    pub fn new(result: StandardizedResult) -> Self {
        Self { result: Box::new(result) }
    }

    /// HTTP-equivalent status.
    pub fn status(&self) -> u16 {
        self.result.status()
    }

    /// Destination or fallback message.
    pub fn message(&self) -> &str {
        self.result.message()
    }

    /// OAuth failure sub-category.
    pub fn auth_error_category(&self) -> AuthErrorCategory {
        self.result.auth_error_category()
    }

    /// Classification metadata.
    pub fn stat_tags(&self) -> &StatTags {
        self.result.stat_tags()
    }

    /// Access token of the failed request, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.result.access_token()
    }

    /// Borrows the underlying result.
    pub fn result(&self) -> &StandardizedResult {
        &self.result
    }

    /// Unwraps into the underlying result.
    pub fn into_result(self) -> StandardizedResult {
        *self.result
    }

    /// Attaches the destination's raw response.
    #[must_use]
    pub fn with_destination_response(self, response: serde_json::Value) -> Self {
        Self::new(self.into_result().with_destination_response(response))
    }
}

impl From<StandardizedResult> for DestinationError {
    fn from(result: StandardizedResult) -> Self {
        Self::new(result)
    }
}

/// Failure raised while transforming an event or handling a response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Malformed or unsupported input. Never retried.
    #[error("{message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// Destination rejected the request.
    #[error(transparent)]
    Destination(#[from] DestinationError),

    /// OS or network level fault, identified by its system code.
    #[error("{message}")]
    SystemTransport {
        /// System error code such as `ECONNREFUSED`
        code: String,
        /// Underlying error description
        message: String,
    },

    /// Anything that fits no other category.
    #[error("{message}")]
    Unclassified {
        /// Error description
        message: String,
    },
}

impl TransformError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Creates a system transport error.
    pub fn system_transport(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SystemTransport { code: code.into(), message: message.into() }
    }

    /// Creates an unclassified error.
    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified { message: message.into() }
    }

    /// HTTP status carried by the error itself, if any.
    ///
    /// System transport and unclassified errors carry none; callers resolve
    /// those through the system code or fall back to 400.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::Destination(error) => Some(error.status()),
            Self::SystemTransport { .. } | Self::Unclassified { .. } => None,
        }
    }

    /// System error code carried by the error, if any.
    pub fn system_code(&self) -> Option<&str> {
        match self {
            Self::SystemTransport { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Short category label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Destination(_) => "destination",
            Self::SystemTransport { .. } => "system_transport",
            Self::Unclassified { .. } => "unclassified",
        }
    }
}
