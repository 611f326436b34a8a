//! Connection management for the gateway link.

pub mod config;
pub mod discovery;
mod manager;
mod monitor;

pub use config::{ConnectionConfig, DiscoveryConfig};
pub use discovery::{discover, DiscoveredInstance};
pub use manager::{ConnectionManager, ProbeResult, PROBE_SENTINEL};
