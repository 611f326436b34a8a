//! Response cache configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// When false every request goes to the gateway.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum number of cached replies.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// TTL for data types without their own (seconds).
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

const fn default_enabled() -> bool {
    true
}

const fn default_max_size() -> usize {
    100
}

const fn default_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size: default_max_size(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.default_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.default_ttl_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
