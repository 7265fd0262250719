//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `DASHBOARD__*` environment variables, then a bare `PORT`.

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use storage::TableRef;
use thiserror::Error;
use tracing::Level;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dashboard";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// `sqlite://` URL of the reading store
    pub database_url: String,
    /// Pool size for the store
    pub max_connections: u32,
    /// Reading table
    pub table: TableRef,
    /// Largest accepted range span (ms)
    pub max_range_ms: i64,
    /// Deadline for a single range query (ms)
    pub query_timeout_ms: u64,
    /// Header carrying the proxy-asserted caller email
    pub identity_header: String,
    /// Directory of dashboard assets
    pub static_dir: String,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter listen address, disabled when unset
    pub metrics_addr: Option<String>,
}

impl ServiceConfig {
    /// Load from `DASHBOARD_CONFIG` (or `dashboard.toml`) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var("DASHBOARD_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let builder = Self::defaults()?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("DASHBOARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("port", std::env::var("PORT").ok())?;

        Self::from_builder(builder)
    }

    /// Builder pre-populated with every default
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("database_url", "sqlite://telemetry.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("table.project", "local")?
            .set_default("table.dataset", "main")?
            .set_default("table.table", "sensor_readings")?
            .set_default("max_range_ms", data_validator::DEFAULT_MAX_SPAN_MS)?
            .set_default("query_timeout_ms", 10_000_i64)?
            .set_default("identity_header", "x-goog-authenticated-user-email")?
            .set_default("static_dir", "public")?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?)
    }

    /// Build and validate from an assembled builder
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ServiceConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_range_ms <= 0 {
            return Err(ConfigError::Invalid("max_range_ms must be positive".to_string()));
        }
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid("query_timeout_ms must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be positive".to_string()));
        }
        axum::http::HeaderName::from_str(&self.identity_header).map_err(|_| {
            ConfigError::Invalid(format!(
                "identity_header {:?} is not a header name",
                self.identity_header
            ))
        })?;
        self.level()?;
        self.metrics_socket()?;
        Ok(())
    }

    /// Address the HTTP server binds
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Parsed log level
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::Invalid(format!("unknown log_level {:?}", self.log_level)))
    }

    /// Parsed metrics exporter address
    pub fn metrics_socket(&self) -> Result<Option<SocketAddr>, ConfigError> {
        self.metrics_addr
            .as_deref()
            .map(|addr| {
                addr.parse().map_err(|_| {
                    ConfigError::Invalid(format!(
                        "metrics_addr {:?} is not a socket address",
                        addr
                    ))
                })
            })
            .transpose()
    }
}
