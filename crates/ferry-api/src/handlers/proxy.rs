//! Destination response transform endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::create_error_response;
use crate::{error::ApiError, AppState};

/// Classifies what `destination` answered to a proxied request.
///
/// The body is the proxy payload `{responseBody, status, payload}`. The
/// response carries the standardized result and uses its status as the HTTP
/// status, so auth and retry decisions can be read off the status line.
///
/// # Errors
///
/// Returns 400 when the destination is unknown or the body is not JSON.
#[instrument(name = "proxy_response", skip(app_state, body), fields(destination = %destination))]
pub async fn proxy_response(
    Path(destination): Path<String>,
    State(app_state): State<AppState>,
    body: Bytes,
) -> Response {
    let Some(handler) = app_state.registry.handler(&destination) else {
        warn!("No response handler registered");
        return create_error_response(&ApiError::UnknownDestination { name: destination });
    };

    let proxy: Value = match serde_json::from_slice(&body) {
        Ok(proxy) => proxy,
        Err(e) => {
            warn!(error = %e, "Rejecting unparsable proxy payload");
            return create_error_response(&ApiError::from(e));
        },
    };

    let result = match handler.response_transform(&proxy) {
        Ok(result) => result,
        Err(error) => error.into_result(),
    };

    info!(
        status = result.status(),
        meta = %result.stat_tags().meta,
        auth_error_category = ?result.auth_error_category(),
        "Destination response classified"
    );

    let status = StatusCode::from_u16(result.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(result)).into_response()
}
