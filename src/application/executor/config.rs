//! Task executor configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    /// Concurrent execution slots; host parallelism clamped to 2..=8 when unset.
    #[serde(default)]
    pub max_threads: Option<usize>,
    /// Finished results kept for history queries.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Cancel tasks that run longer than this.
    #[serde(default)]
    pub task_timeout_ms: Option<u64>,
}

const fn default_history_capacity() -> usize {
    100
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            history_capacity: default_history_capacity(),
            task_timeout_ms: None,
        }
    }
}

/// Slot count used when none is configured.
#[must_use]
pub fn default_width() -> usize {
    num_cpus::get().clamp(2, 8)
}

impl ExecutorConfig {
    #[must_use]
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.max_threads.unwrap_or_else(default_width)
    }

    #[must_use]
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "executor.max_threads",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.history_capacity",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.task_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "executor.task_timeout_ms",
                reason: "must be greater than 0 when set".to_string(),
            });
        }
        Ok(())
    }
}
