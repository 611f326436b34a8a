//! Adapters (hexagonal outer layer): concrete implementations of the ports.

pub mod outbound;
