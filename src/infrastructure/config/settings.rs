//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; `TALLY_HOST` and `TALLY_PORT`
//! override the gateway address.
//!
//! # Example
//!
//! ```no_run
//! use tallybridge::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::application::cache::CacheConfig;
use crate::application::connection::{ConnectionConfig, DiscoveryConfig};
use crate::application::executor::ExecutorConfig;
use crate::application::reader::ReaderConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `connection.host`.
pub const HOST_ENV: &str = "TALLY_HOST";
/// Environment variable overriding `connection.port`.
pub const PORT_ENV: &str = "TALLY_PORT";

/// Main application configuration.
///
/// Every section is optional; an empty file yields a configuration for a
/// gateway on `localhost:9000`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Gateway address, timeouts and retries.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Candidate hosts and ports for instance discovery.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Response cache sizing and TTL.
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub reader: ReaderConfig,

    /// Background task pool.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, apply environment overrides and
    /// validate.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - An override or a configured value is invalid
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TALLY_HOST` / `TALLY_PORT` from `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<(), ConfigError> {
        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.connection.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.connection.port =
                port.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "TALLY_PORT",
                        reason: format!("not a port number: {port}"),
                    })?;
        }
        Ok(())
    }

    /// Validate every section.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.connection.validate()?;
        self.discovery.validate()?;
        self.cache.validate()?;
        self.reader.validate()?;
        self.executor.validate()?;
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
