//! Batch router endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use ferry_core::BatchResult;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::create_error_response;
use crate::{error::ApiError, AppState};

/// Router response body.
#[derive(Debug, Serialize)]
pub struct RouterResponse {
    /// One entry per input event, in input order
    pub output: Vec<BatchResult>,
}

/// Transforms a batch of events for `destination`.
///
/// The body is `{"input": [...]}`. Per-event failures are reported inside
/// `output` and the response is 200 regardless.
///
/// # Errors
///
/// Returns 400 when the destination is unknown or the body is not JSON.
#[instrument(name = "route_batch", skip(app_state, body), fields(destination = %destination))]
pub async fn route_batch(
    Path(destination): Path<String>,
    State(app_state): State<AppState>,
    body: Bytes,
) -> Response {
    let Some(reconciler) = app_state.registry.reconciler(&destination) else {
        warn!("No processor registered");
        return create_error_response(&ApiError::UnknownDestination { name: destination });
    };

    let request: Value = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejecting unparsable router request");
            return create_error_response(&ApiError::from(e));
        },
    };

    let input = request.get("input").cloned().unwrap_or(Value::Null);
    let output = reconciler.process_batch(input).await;

    let failed = output.iter().filter(|entry| !entry.is_success()).count();
    info!(events = output.len(), failed, "Batch transformed");

    (StatusCode::OK, Json(RouterResponse { output })).into_response()
}
