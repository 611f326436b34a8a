//! Application services.
//!
//! The connection manager, response reader, cache and task executor. They
//! talk to the outside world only through the ports in [`crate::port`].

pub mod cache;
pub mod connection;
pub mod executor;
pub mod reader;
