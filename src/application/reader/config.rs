//! Response reader configuration.

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReaderConfig {
    /// Number of recent errors kept for diagnostics.
    #[serde(default = "default_recent_error_capacity")]
    pub recent_error_capacity: usize,
}

const fn default_recent_error_capacity() -> usize {
    10
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            recent_error_capacity: default_recent_error_capacity(),
        }
    }
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_error_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reader.recent_error_capacity",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
