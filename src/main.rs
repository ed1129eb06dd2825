//! Ferry destination delivery service.
//!
//! Main entry point for the ferry server. Loads configuration, wires the
//! destination registry and serves until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use ferry_api::{start_server, AppState, Config};
use ferry_delivery::{DestinationRegistry, HttpTransport, OutcomeClassifier};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting ferry destination delivery service");

    let addr = config.parse_server_addr()?;
    let transport_config = config.to_transport_config();
    info!(
        server_addr = %addr,
        transport_timeout_seconds = transport_config.timeout.as_secs(),
        retryable_statuses = %config.retryable_statuses,
        "Configuration loaded"
    );

    let transport = HttpTransport::new(&transport_config)
        .context("Failed to build outbound transport")?;
    let transport = Arc::new(transport);
    let classifier = OutcomeClassifier::new(config.to_retryable_statuses()?);
    let registry = DestinationRegistry::with_defaults(transport, classifier);
    info!(destinations = ?registry.processor_names(), "Destination registry ready");

    start_server(AppState::new(registry), addr, config.request_timeout())
        .await
        .context("HTTP server failed")?;

    info!("Ferry shutdown complete");
    Ok(())
}

/// Initializes tracing. `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}
