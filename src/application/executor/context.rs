//! Per-task handle given to a running worker.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::domain::{TaskId, TaskProgress};
use crate::port::{Event, Notifier};

/// Progress and cancellation for one task.
#[derive(Clone)]
pub struct TaskContext {
    task_id: TaskId,
    token: CancellationToken,
    progress: Arc<Mutex<TaskProgress>>,
    notifier: Arc<dyn Notifier>,
}

impl TaskContext {
    pub(super) fn new(
        task_id: TaskId,
        token: CancellationToken,
        progress: Arc<Mutex<TaskProgress>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            task_id,
            token,
            progress,
            notifier,
        }
    }

    #[must_use]
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested; for use in `select!`.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Publish progress. The percentage is clamped to `0..=100`; updates
    /// after cancellation are dropped.
    pub fn report_progress(&self, percentage: i32, message: impl Into<String>) {
        if self.is_cancelled() {
            return;
        }
        let progress = TaskProgress::new(percentage, message);
        *self.progress.lock() = progress.clone();
        self.notifier.notify(Event::TaskProgress {
            task_id: self.task_id,
            progress,
        });
    }
}
