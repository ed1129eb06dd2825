//! Health check handlers for service monitoring.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Seconds since the service started
    pub uptime_seconds: i64,
    /// Destinations with a registered event processor
    pub destinations: Vec<String>,
    /// Service version information
    pub version: String,
}

/// Overall health status enumeration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Destinations are registered and requests can be served
    Healthy,
    /// No destination is registered
    Unhealthy,
}

/// Primary health check endpoint.
///
/// The service holds no external connections, so health reduces to
/// whether any destination is registered.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let now = Utc::now();
    let destinations: Vec<String> =
        app_state.registry.processor_names().into_iter().map(str::to_string).collect();

    let status =
        if destinations.is_empty() { HealthStatus::Unhealthy } else { HealthStatus::Healthy };
    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        timestamp: now,
        uptime_seconds: (now - app_state.started_at).num_seconds(),
        destinations,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    debug!(status = ?response.status, "Health check completed");

    (status_code, Json(response)).into_response()
}

/// Liveness check endpoint for Kubernetes probes.
///
/// Returns a simple response indicating the service process is alive.
#[instrument(name = "liveness_check", skip_all)]
pub async fn liveness_check() -> Response {
    debug!("Performing liveness check");

    let response = serde_json::json!({
        "status": "alive",
        "timestamp": Utc::now(),
        "service": "ferry-api"
    });

    (StatusCode::OK, Json(response)).into_response()
}
