//! Configuration management for the ferry service.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use ferry_delivery::{RetryableStatuses, TransportConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "ferry.toml";

/// Service configuration with defaults, file, and environment overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`ferry.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```no_run
/// use ferry_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Outbound transport
    /// Timeout for calls made to destinations while building requests, in
    /// seconds.
    ///
    /// Environment variable: `TRANSPORT_TIMEOUT_SECONDS`
    #[serde(default = "default_transport_timeout", alias = "TRANSPORT_TIMEOUT_SECONDS")]
    pub transport_timeout_seconds: u64,
    /// User agent sent to destinations.
    ///
    /// Environment variable: `USER_AGENT`
    #[serde(default = "default_user_agent", alias = "USER_AGENT")]
    pub user_agent: String,

    // Classification
    /// HTTP statuses treated as retryable, as comma-separated statuses and
    /// inclusive ranges (`"408,500-599"`). 429 is always reported as
    /// throttled and may not appear here.
    ///
    /// Environment variable: `RETRYABLE_STATUSES`
    #[serde(default = "default_retryable_statuses", alias = "RETRYABLE_STATUSES")]
    pub retryable_statuses: String,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be parsed or the merged values do not
    /// validate.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the outbound transport configuration.
    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.transport_timeout_seconds),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Convert to the classifier's retryable set.
    ///
    /// # Errors
    ///
    /// Fails when the status list is malformed.
    pub fn to_retryable_statuses(&self) -> Result<RetryableStatuses> {
        parse_statuses(&self.retryable_statuses).map(RetryableStatuses::new)
    }

    /// Server request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Fails when host and port do not form a socket address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Names the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.transport_timeout_seconds == 0 {
            anyhow::bail!("transport_timeout_seconds must be greater than 0");
        }

        let statuses = parse_statuses(&self.retryable_statuses)?;
        if let Some(status) = statuses.iter().find(|status| !(100..=599).contains(*status)) {
            anyhow::bail!("retryable_statuses contains {status}, outside 100-599");
        }
        if statuses.contains(&429) {
            anyhow::bail!("retryable_statuses must not contain 429; it is always throttled");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            transport_timeout_seconds: default_transport_timeout(),
            user_agent: default_user_agent(),
            retryable_statuses: default_retryable_statuses(),
            rust_log: default_log_level(),
        }
    }
}

/// Parses `"408,500-599"` into individual statuses.
fn parse_statuses(list: &str) -> Result<Vec<u16>> {
    let mut statuses = Vec::new();

    for part in list.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u16 = start
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid retryable status range: {part}"))?;
                let end: u16 = end
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid retryable status range: {part}"))?;
                if start > end {
                    anyhow::bail!("invalid retryable status range: {part}");
                }
                statuses.extend(start..=end);
            },
            None => {
                statuses.push(
                    part.parse().with_context(|| format!("invalid retryable status: {part}"))?,
                );
            },
        }
    }

    Ok(statuses)
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_request_timeout() -> u64 {
    30
}

fn default_transport_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    TransportConfig::default().user_agent
}

fn default_retryable_statuses() -> String {
    "408,500-599".to_string()
}

fn default_log_level() -> String {
    "info,ferry=debug,tower_http=debug".to_string()
}
