//! Ferry HTTP API.
//!
//! Exposes the batch router and the destination response transform over
//! HTTP, together with health probes and the service configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ferry_delivery::DestinationRegistry;

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use error::ApiError;
pub use server::{create_router, create_router_with_timeout, start_server};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Destinations served by this instance.
    pub registry: Arc<DestinationRegistry>,
    /// When the process started serving.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state around `registry`, stamped with the current time.
    pub fn new(registry: DestinationRegistry) -> Self {
        Self { registry: Arc::new(registry), started_at: Utc::now() }
    }
}
