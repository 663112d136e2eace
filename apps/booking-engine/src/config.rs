//! Configuration for the booking engine.
//!
//! Loaded from an optional YAML file; every section has full defaults so a
//! missing file (or a partial one) still yields a runnable configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use booking_engine::config::load_config;
//!
//! // Load from default path (config.yaml), falling back to defaults.
//! let config = load_config(None)?;
//!
//! // Load from custom path (must exist).
//! let config = load_config(Some("custom/config.yaml"))?;
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::trade::validation::TradeLimits;

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse the YAML configuration.
    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("config validation failed: {0}")]
    Validation(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Storage engine configuration.
    pub storage: StorageConfig,
    /// Trade validation bounds.
    pub limits: TradeLimits,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port for the JSON API.
    pub http_port: u16,
    /// Bind address.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Storage engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Bound on waiting for the database write lock, in milliseconds.
    /// Exceeding it surfaces as a retryable busy error.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "data/trades.db".to_string(),
            busy_timeout_ms: 5_000,
        }
    }
}

impl StorageConfig {
    /// Busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Config {
    /// Validate cross-field consistency.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] naming the first inconsistent setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.db_path.is_empty() {
            return Err(ConfigError::Validation(
                "storage.db_path must not be empty".to_string(),
            ));
        }
        if self.storage.busy_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "storage.busy_timeout_ms must be positive".to_string(),
            ));
        }
        if self.limits.allowed_currencies.is_empty() {
            return Err(ConfigError::Validation(
                "limits.allowed_currencies must not be empty".to_string(),
            ));
        }
        if self.limits.min_trade_amount >= self.limits.max_trade_amount {
            return Err(ConfigError::Validation(
                "limits.min_trade_amount must be below limits.max_trade_amount".to_string(),
            ));
        }
        if self.limits.min_exchange_rate >= self.limits.max_exchange_rate {
            return Err(ConfigError::Validation(
                "limits.min_exchange_rate must be below limits.max_exchange_rate".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a YAML file.
///
/// With an explicit `path` the file must exist; with `None`, a missing
/// `config.yaml` falls back to defaults.
///
/// # Errors
///
/// Read, parse or validation errors as [`ConfigError`].
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p, true),
        None => (DEFAULT_CONFIG_PATH, false),
    };

    let config = match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml_bw::from_str(&contents)?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
            tracing::info!(path, "no config file found, using defaults");
            Config::default()
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.to_string(),
                source: err,
            })
        }
    };

    config.validate()?;
    Ok(config)
}
