//! Bounded TTL + LRU cache for parsed gateway replies.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use crate::domain::{DataType, RequestParams};

/// Deterministic cache key for a request: `"{data_type}|k1=v1&k2=v2"`.
#[must_use]
pub fn cache_key(data_type: DataType, params: &RequestParams) -> String {
    format!("{data_type}|{}", params.canonical())
}

/// One cached value with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub inserted_at: Instant,
    pub ttl: Duration,
    /// Logical clock value of the last read or write, for LRU ordering.
    last_access: u64,
    access_count: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }

    #[must_use]
    pub fn access_count(&self) -> u64 {
        self.access_count
    }
}

/// Counters exposed for observability. Never reset implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Hit percentage, `0.0` before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64 * 100.0
        }
    }
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<V> CacheState<V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) -> Option<String> {
        let key = self
            .entries
            .values()
            .min_by_key(|entry| entry.last_access)
            .map(|entry| entry.key.clone())?;
        self.entries.remove(&key);
        self.evictions += 1;
        Some(key)
    }
}

/// Thread-safe cache keyed by `(data type, params)`.
///
/// Size never exceeds `max_size`; inserting a new key at capacity evicts the
/// least-recently-accessed entry first. Expired entries are dropped lazily on
/// lookup or eagerly via [`cleanup_expired`](Self::cleanup_expired).
pub struct DataCache<V> {
    state: Mutex<CacheState<V>>,
    max_size: usize,
    default_ttl: Duration,
}

impl<V: Clone> DataCache<V> {
    #[must_use]
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_size: max_size.max(1),
            default_ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, config.default_ttl())
    }

    /// Fresh value for the request, if any.
    pub fn get(&self, data_type: DataType, params: &RequestParams) -> Option<V> {
        self.get_by_key(&cache_key(data_type, params))
    }

    pub fn get_by_key(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let Some(expired) = state.entries.get(key).map(|entry| entry.is_expired(now)) else {
            state.misses += 1;
            return None;
        };
        if expired {
            state.entries.remove(key);
            state.expirations += 1;
            state.misses += 1;
            debug!(key, "Cache entry expired");
            return None;
        }

        let tick = state.tick();
        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.last_access = tick;
        entry.access_count += 1;
        Some(entry.value.clone())
    }

    /// Insert or replace. `ttl` defaults to the cache-wide default.
    pub fn put(
        &self,
        data_type: DataType,
        params: &RequestParams,
        value: V,
        ttl: Option<Duration>,
    ) {
        self.put_by_key(cache_key(data_type, params), value, ttl);
    }

    pub fn put_by_key(&self, key: String, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_size {
            if let Some(evicted) = state.evict_least_recent() {
                debug!(key = %evicted, "Evicted least recently used cache entry");
            }
        }

        let tick = state.tick();
        state.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                inserted_at: Instant::now(),
                ttl,
                last_access: tick,
                access_count: 0,
            },
        );
    }

    /// Remove every stale entry; returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - state.entries.len();
        state.expirations += removed as u64;
        if removed > 0 {
            debug!(removed, "Removed expired cache entries");
        }
        removed
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn remove(&self, data_type: DataType, params: &RequestParams) -> Option<V> {
        self.state
            .lock()
            .entries
            .remove(&cache_key(data_type, params))
            .map(|entry| entry.value)
    }

    #[must_use]
    pub fn contains(&self, data_type: DataType, params: &RequestParams) -> bool {
        self.state
            .lock()
            .entries
            .contains_key(&cache_key(data_type, params))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            max_size: self.max_size,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
        }
    }
}
