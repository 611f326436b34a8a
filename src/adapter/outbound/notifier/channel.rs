//! Channel-backed notifier for a presentation layer running its own loop.

use tokio::sync::mpsc;
use tracing::debug;

use crate::port::outbound::notifier::{Event, Notifier};

/// Forwards every event into an unbounded tokio channel.
///
/// Sending never blocks. Once the receiver is dropped events are discarded.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wrap an existing sender.
    #[must_use]
    pub fn from_sender(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: Event) {
        if self.tx.send(event).is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }
}
