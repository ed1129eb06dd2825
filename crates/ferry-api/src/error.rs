//! API error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors returned by the HTTP surface itself, as opposed to per-event
/// failures which travel inside a successful response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No processor or handler is registered for the destination (E1001).
    #[error("[E1001] Unknown destination: {name} is not supported")]
    UnknownDestination {
        /// Destination named in the request path
        name: String,
    },

    /// Request body is not valid JSON (E1002).
    #[error("[E1002] Invalid request body: {reason}")]
    InvalidBody {
        /// Parser diagnostic
        reason: String,
    },
}

impl ApiError {
    /// Error code from the taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownDestination { .. } => "E1001",
            Self::InvalidBody { .. } => "E1002",
        }
    }

    /// HTTP status for the error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownDestination { .. } | Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidBody { reason: err.to_string() }
    }
}
