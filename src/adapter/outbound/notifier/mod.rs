//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for event consumers outside the
//! core.

mod channel;

pub use channel::ChannelNotifier;
