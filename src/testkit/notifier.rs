//! Event-recording [`Notifier`] for tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{ConnectionStatus, TaskId};
use crate::port::{Event, Notifier};

/// Keeps every event it receives. Cloning shares the log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Statuses carried by status-changed events, in order.
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::StatusChanged { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    /// Codes of error-occurred events, in order.
    pub fn error_kinds(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::ErrorOccurred { kind, .. } => Some(kind.clone()),
                _ => None,
            })
            .collect()
    }

    /// Short labels of one task's events, in order.
    pub fn task_events(&self, task_id: TaskId) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.task_id() == Some(task_id))
            .map(label)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Short name of an event kind.
pub fn label(event: &Event) -> &'static str {
    match event {
        Event::StatusChanged { .. } => "status_changed",
        Event::CompanyInfoReceived(_) => "company_info",
        Event::ErrorOccurred { .. } => "error",
        Event::DataReceived { .. } => "data",
        Event::VoucherPosted(_) => "voucher_posted",
        Event::TaskAdded { .. } => "added",
        Event::TaskStarted { .. } => "started",
        Event::TaskProgress { .. } => "progress",
        Event::TaskCancelled { .. } => "cancelled",
        Event::TaskFailed { .. } => "failed",
        Event::TaskCompleted(_) => "completed",
    }
}
