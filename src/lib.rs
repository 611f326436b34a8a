//! tallybridge - connection, response-reading and background-task core for
//! the TallyPrime HTTP-XML gateway.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Value types: connection status, data types, replies,
//!   posting results, task lifecycle
//! - [`port`] - Traits at the seams: [`port::Transport`] for HTTP and
//!   [`port::Notifier`] for boundary events
//! - [`adapter`] - reqwest transport and channel notifier
//! - [`application`] - The core:
//!   - `connection::ConnectionManager` - status, retries, stats, discovery,
//!     monitoring
//!   - `reader::ResponseReader` - envelopes, cleaning, validation, caching,
//!     voucher posting
//!   - `cache::DataCache` - TTL + LRU store
//!   - `executor::TaskExecutor` - bounded priority pool with cooperative
//!     cancellation
//! - [`infrastructure`] - Configuration, logging and component wiring
//! - [`cli`] - Command-line interface used by the `tallybridge` binary
//!
//! # Example
//!
//! ```no_run
//! use tallybridge::domain::{DataType, RequestParams};
//! use tallybridge::infrastructure::bootstrap::Gateway;
//! use tallybridge::infrastructure::config::Config;
//!
//! # async fn run() -> tallybridge::error::Result<()> {
//! let gateway = Gateway::from_config(&Config::default())?;
//! let probe = gateway.connection.test_connection().await;
//! if probe.success {
//!     let payload = gateway
//!         .reader
//!         .fetch(DataType::LedgerList, &RequestParams::new())
//!         .await?;
//!     println!("{} ledgers", payload.item_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Error, Result};
