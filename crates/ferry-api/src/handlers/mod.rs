//! HTTP request handlers for the ferry API.
//!
//! Handlers are grouped by functionality:
//! - `router` - batch transformation of events into destination requests
//! - `proxy` - classification of destination responses
//! - `health` - liveness and health probes
//!
//! # Error Handling
//!
//! Failures of the request itself (unknown destination, unparsable body)
//! return an [`ErrorResponse`] with a taxonomy code. Failures of individual
//! events are not request failures and travel inside a 200 response.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

pub mod health;
pub mod proxy;
pub mod router;

pub use health::{health_check, liveness_check};
pub use proxy::proxy_response;
pub use router::route_batch;

/// Standardized error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error details including code and message
    pub error: ErrorDetail,
}

/// Detailed error information.
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code from the taxonomy (E1001-E1002)
    pub code: String,
    /// Human-readable error description
    pub message: String,
}

fn create_error_response(error: &ApiError) -> Response {
    let error_response = ErrorResponse {
        error: ErrorDetail { code: error.code().to_string(), message: error.to_string() },
    };

    (error.status(), Json(error_response)).into_response()
}
