//! Notifier port for boundary events.
//!
//! The core never renders or persists anything. It reports status changes,
//! fetched data, errors and task lifecycle through this trait, and the
//! presentation layer decides what to do with them.

use crate::domain::{
    CompanyInfo, ConnectionStatus, Payload, PostingResult, TaskId, TaskProgress, TaskResult,
};

/// Events emitted by the connection manager, reader and executor.
#[derive(Debug, Clone)]
pub enum Event {
    /// Effective connection status changed.
    StatusChanged {
        status: ConnectionStatus,
        message: String,
    },
    /// Company metadata was retrieved.
    CompanyInfoReceived(CompanyInfo),
    /// A classified failure, e.g. `CONNECTION_REFUSED` or `PARSE_ERROR`.
    ErrorOccurred { kind: String, message: String },
    /// A reply was validated and is ready for display.
    DataReceived { operation: String, payload: Payload },
    /// A voucher import finished, successfully or not.
    VoucherPosted(PostingResult),
    TaskAdded { task_id: TaskId, name: String },
    TaskStarted { task_id: TaskId, name: String },
    TaskProgress {
        task_id: TaskId,
        progress: TaskProgress,
    },
    TaskCancelled { task_id: TaskId },
    TaskFailed {
        task_id: TaskId,
        error: String,
        details: Option<String>,
    },
    /// Always the last event of a task, whatever its outcome.
    TaskCompleted(TaskResult),
}

impl Event {
    /// Task the event belongs to, if any.
    #[must_use]
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::TaskAdded { task_id, .. }
            | Self::TaskStarted { task_id, .. }
            | Self::TaskProgress { task_id, .. }
            | Self::TaskCancelled { task_id }
            | Self::TaskFailed { task_id, .. } => Some(*task_id),
            Self::TaskCompleted(result) => Some(result.task_id),
            _ => None,
        }
    }
}

/// Trait for event handlers.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `notify` is called from worker tasks and monitoring ticks and must not
///   block; hand slow work off to a channel or a spawned task
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        self.notify_all(event);
    }
}

/// A no-op notifier for tests or headless use.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{debug, info, warn};
        match event {
            Event::StatusChanged { status, message } => {
                info!(status = %status, message = %message, "Connection status changed");
            }
            Event::CompanyInfoReceived(info) => {
                info!(
                    company = %info.name,
                    guid = info.guid.as_deref().unwrap_or("-"),
                    "Company info received"
                );
            }
            Event::ErrorOccurred { kind, message } => {
                warn!(kind = %kind, message = %message, "Gateway error");
            }
            Event::DataReceived { operation, payload } => {
                info!(operation = %operation, items = payload.item_count(), "Data received");
            }
            Event::VoucherPosted(result) => {
                info!(
                    success = result.success,
                    voucher_id = result.voucher_id.as_deref().unwrap_or("-"),
                    errors = result.errors,
                    "Voucher posted"
                );
            }
            Event::TaskAdded { task_id, name } => {
                debug!(task_id = %task_id, name = %name, "Task added");
            }
            Event::TaskStarted { task_id, name } => {
                info!(task_id = %task_id, name = %name, "Task started");
            }
            Event::TaskProgress { task_id, progress } => {
                debug!(
                    task_id = %task_id,
                    percentage = progress.percentage,
                    message = %progress.message,
                    "Task progress"
                );
            }
            Event::TaskCancelled { task_id } => {
                info!(task_id = %task_id, "Task cancelled");
            }
            Event::TaskFailed { task_id, error, .. } => {
                warn!(task_id = %task_id, error = %error, "Task failed");
            }
            Event::TaskCompleted(result) => {
                info!(
                    task_id = %result.task_id,
                    name = %result.name,
                    status = %result.status,
                    elapsed_ms = result.execution_time.as_millis() as u64,
                    "Task completed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_events_expose_their_id() {
        let id = TaskId::new();
        assert_eq!(Event::TaskCancelled { task_id: id }.task_id(), Some(id));
        let status = Event::StatusChanged {
            status: ConnectionStatus::Connected,
            message: String::new(),
        };
        assert_eq!(status.task_id(), None);
    }
}
