//! Response cache.

mod config;
mod data;

pub use config::CacheConfig;
pub use data::{cache_key, CacheEntry, CacheStats, DataCache};
