//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::application::cache::CacheConfig;
use crate::application::connection::ConnectionConfig;
use crate::application::executor::ExecutorConfig;
use crate::application::reader::ReaderConfig;

/// Single attempt, short timeout.
pub fn connection(port: u16) -> ConnectionConfig {
    ConnectionConfig {
        timeout_ms: 2_000,
        retry_count: 1,
        retry_delay_ms: 0,
        ..ConnectionConfig::new("127.0.0.1", port)
    }
}

/// `attempts` attempts with no delay between them.
pub fn connection_with_retries(port: u16, attempts: u32) -> ConnectionConfig {
    ConnectionConfig {
        retry_count: attempts,
        ..connection(port)
    }
}

pub fn cache(max_size: usize) -> CacheConfig {
    CacheConfig {
        max_size,
        ..CacheConfig::default()
    }
}

pub fn reader() -> ReaderConfig {
    ReaderConfig::default()
}

/// Fixed pool width, small history.
pub fn executor(max_threads: usize) -> ExecutorConfig {
    ExecutorConfig {
        max_threads: Some(max_threads),
        history_capacity: 50,
        task_timeout_ms: None,
    }
}
