//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`] - [`ScriptedTransport`](transport::ScriptedTransport), a
//!   [`Transport`](crate::port::Transport) with queued replies.
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier) that
//!   keeps every event for assertions.
//! - [`config`] - Canonical test configurations (fast timeouts, no retry delay).
//! - [`fixtures`] - Captured gateway replies and voucher samples.

pub mod config;
pub mod fixtures;
pub mod notifier;
pub mod transport;
