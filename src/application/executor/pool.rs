//! Bounded priority pool for background tasks.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::ExecutorConfig;
use super::context::TaskContext;
use super::worker::Worker;
use crate::domain::{TaskId, TaskPriority, TaskProgress, TaskResult, TaskSnapshot, TaskStatus};
use crate::error::{Error, ErrorKind};
use crate::port::{Event, Notifier};

struct Queued {
    task_id: TaskId,
    priority: TaskPriority,
    seq: u64,
    worker: Arc<dyn Worker>,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: higher priority first, then lower sequence number.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Scheduler {
    queue: BinaryHeap<Queued>,
    running: usize,
    peak_running: usize,
    next_seq: u64,
}

struct ActiveTask {
    name: String,
    priority: TaskPriority,
    status: TaskStatus,
    token: CancellationToken,
    progress: Arc<Mutex<TaskProgress>>,
    submitted_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
}

/// How a task ended, before it is turned into a [`TaskResult`].
enum Outcome {
    Completed(Value),
    Failed { error: String, details: String },
    Cancelled(Option<String>),
}

struct Inner {
    width: usize,
    history_capacity: usize,
    task_timeout: Option<Duration>,
    notifier: Arc<dyn Notifier>,
    runtime: Handle,
    scheduler: Mutex<Scheduler>,
    active: DashMap<TaskId, ActiveTask>,
    history: Mutex<VecDeque<TaskResult>>,
    finished: Notify,
}

/// Runs [`Worker`]s on at most `width` concurrent slots.
///
/// Pending tasks are admitted highest priority first, FIFO within a
/// priority. Every task emits `TaskAdded`, then `TaskStarted`, progress,
/// an outcome event for failure or cancellation, and always a final
/// `TaskCompleted`. Cloning yields another handle to the same pool.
#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<Inner>,
}

impl TaskExecutor {
    /// Create a pool bound to the current tokio runtime.
    pub fn new(config: &ExecutorConfig, notifier: Arc<dyn Notifier>) -> Result<Self, Error> {
        config.validate()?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::Runtime(format!("task executor needs a tokio runtime: {e}")))?;
        let width = config.width();
        info!(max_threads = width, "Task executor ready");
        Ok(Self {
            inner: Arc::new(Inner {
                width,
                history_capacity: config.history_capacity,
                task_timeout: config.task_timeout(),
                notifier,
                runtime,
                scheduler: Mutex::new(Scheduler::default()),
                active: DashMap::new(),
                history: Mutex::new(VecDeque::with_capacity(config.history_capacity)),
                finished: Notify::new(),
            }),
        })
    }

    #[must_use]
    pub fn max_threads(&self) -> usize {
        self.inner.width
    }

    /// Queue a worker; returns its id immediately.
    pub fn submit<W: Worker>(&self, worker: W) -> TaskId {
        self.submit_shared(Arc::new(worker))
    }

    pub fn submit_shared(&self, worker: Arc<dyn Worker>) -> TaskId {
        let task_id = TaskId::new();
        let name = worker.name();
        let priority = worker.priority();

        self.inner.active.insert(
            task_id,
            ActiveTask {
                name: name.clone(),
                priority,
                status: TaskStatus::Pending,
                token: CancellationToken::new(),
                progress: Arc::new(Mutex::new(TaskProgress::default())),
                submitted_at: Utc::now(),
                started_at: None,
            },
        );
        debug!(task_id = %task_id, name = %name, ?priority, "Task submitted");
        self.inner.notifier.notify(Event::TaskAdded { task_id, name });

        {
            let mut scheduler = self.inner.scheduler.lock();
            let seq = scheduler.next_seq;
            scheduler.next_seq += 1;
            scheduler.queue.push(Queued {
                task_id,
                priority,
                seq,
                worker,
            });
        }
        Inner::dispatch(&self.inner);
        task_id
    }

    /// Request cancellation of one task.
    ///
    /// A pending task is dropped without starting. A running task only sees
    /// its flag set. Returns false for unknown or finished tasks.
    pub fn cancel(&self, task_id: TaskId) -> bool {
        let removed = {
            let mut scheduler = self.inner.scheduler.lock();
            let before = scheduler.queue.len();
            scheduler.queue.retain(|queued| queued.task_id != task_id);
            scheduler.queue.len() != before
        };

        if removed {
            info!(task_id = %task_id, "Pending task cancelled");
            let cancelled = Outcome::Cancelled(Some("Cancelled before start".to_string()));
            Inner::finish(&self.inner, task_id, None, cancelled);
            return true;
        }

        match self.inner.active.get(&task_id) {
            Some(task) => {
                task.token.cancel();
                info!(task_id = %task_id, name = %task.name, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Request cancellation of every unfinished task; returns how many.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<TaskId> = self.inner.active.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Snapshots of pending and running tasks.
    #[must_use]
    pub fn active_tasks(&self) -> Vec<TaskSnapshot> {
        let mut tasks: Vec<TaskSnapshot> = self
            .inner
            .active
            .iter()
            .map(|entry| {
                let task = entry.value();
                TaskSnapshot {
                    task_id: *entry.key(),
                    name: task.name.clone(),
                    priority: task.priority,
                    status: task.status,
                    progress: task.progress.lock().clone(),
                    submitted_at: task.submitted_at,
                    started_at: task.started_at,
                }
            })
            .collect();
        tasks.sort_by_key(|task| task.submitted_at);
        tasks
    }

    /// Up to `limit` finished results, newest first.
    #[must_use]
    pub fn task_history(&self, limit: usize) -> Vec<TaskResult> {
        self.inner
            .history
            .lock()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Current status, if the task is still known.
    #[must_use]
    pub fn status(&self, task_id: TaskId) -> Option<TaskStatus> {
        if let Some(task) = self.inner.active.get(&task_id) {
            return Some(task.status);
        }
        self.result(task_id).map(|result| result.status)
    }

    /// Terminal result of a finished task still in history.
    #[must_use]
    pub fn result(&self, task_id: TaskId) -> Option<TaskResult> {
        self.inner
            .history
            .lock()
            .iter()
            .rev()
            .find(|result| result.task_id == task_id)
            .cloned()
    }

    #[must_use]
    pub fn running_count(&self) -> usize {
        self.inner.scheduler.lock().running
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.scheduler.lock().queue.len()
    }

    /// Highest number of simultaneously running tasks so far.
    #[must_use]
    pub fn peak_running(&self) -> usize {
        self.inner.scheduler.lock().peak_running
    }

    /// Wait for a task to finish. `None` if the id is unknown or its result
    /// already left the history.
    pub async fn wait(&self, task_id: TaskId) -> Option<TaskResult> {
        loop {
            let notified = self.inner.finished.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.result(task_id) {
                return Some(result);
            }
            if !self.inner.active.contains_key(&task_id) {
                return None;
            }
            notified.await;
        }
    }

    /// Wait until no task is pending or running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.finished.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.active.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    /// Start queued tasks while slots are free.
    fn dispatch(this: &Arc<Self>) {
        loop {
            let next = {
                let mut scheduler = this.scheduler.lock();
                if scheduler.running >= this.width {
                    None
                } else {
                    let next = scheduler.queue.pop();
                    if next.is_some() {
                        scheduler.running += 1;
                        scheduler.peak_running = scheduler.peak_running.max(scheduler.running);
                    }
                    next
                }
            };
            let Some(queued) = next else {
                break;
            };
            Self::start(this, queued);
        }
    }

    fn start(this: &Arc<Self>, queued: Queued) {
        let task_id = queued.task_id;
        let prepared = this.active.get_mut(&task_id).map(|mut task| {
            task.status = TaskStatus::Running;
            task.started_at = Some(Utc::now());
            (
                task.name.clone(),
                task.started_at,
                task.token.clone(),
                TaskContext::new(
                    task_id,
                    task.token.clone(),
                    Arc::clone(&task.progress),
                    Arc::clone(&this.notifier),
                ),
            )
        });
        let Some((name, started_at, token, ctx)) = prepared else {
            this.release_slot();
            Self::dispatch(this);
            return;
        };

        let inner = Arc::clone(this);
        let worker = queued.worker;
        this.runtime.spawn(async move {
            debug!(task_id = %task_id, name = %name, "Task started");
            inner.notifier.notify(Event::TaskStarted { task_id, name });

            let started = Instant::now();
            let mut timed_out = false;
            let mut handle = tokio::spawn(async move { worker.execute(ctx).await });

            let joined = match inner.task_timeout {
                Some(limit) => {
                    tokio::select! {
                        joined = &mut handle => joined,
                        () = tokio::time::sleep(limit) => {
                            warn!(task_id = %task_id, timeout_ms = limit.as_millis() as u64, "Task timed out, cancelling");
                            token.cancel();
                            timed_out = true;
                            (&mut handle).await
                        }
                    }
                }
                None => (&mut handle).await,
            };

            let outcome = match outcome_of(joined, token.is_cancelled()) {
                Outcome::Cancelled(None) if timed_out => Outcome::Cancelled(Some(format!(
                    "Timed out after {} ms",
                    inner.task_timeout.unwrap_or_default().as_millis()
                ))),
                other => other,
            };
            Self::finish(&inner, task_id, Some((started_at, started.elapsed())), outcome);
        });
    }

    /// Record the terminal result, emit the closing events and free the slot
    /// if the task held one.
    fn finish(
        this: &Arc<Self>,
        task_id: TaskId,
        ran: Option<(Option<DateTime<Utc>>, Duration)>,
        outcome: Outcome,
    ) {
        let name = this
            .active
            .get(&task_id)
            .map(|task| task.name.clone())
            .unwrap_or_default();
        let (started_at, execution_time) = ran.unwrap_or((None, Duration::ZERO));

        let (status, data, error, error_details) = match outcome {
            Outcome::Completed(value) => (TaskStatus::Completed, Some(value), None, None),
            Outcome::Failed { error, details } => {
                (TaskStatus::Failed, None, Some(error), Some(details))
            }
            Outcome::Cancelled(reason) => (TaskStatus::Cancelled, None, reason, None),
        };

        let result = TaskResult {
            task_id,
            name,
            status,
            data,
            error,
            error_details,
            execution_time,
            started_at,
            completed_at: Utc::now(),
        };

        match status {
            TaskStatus::Cancelled => {
                this.notifier.notify(Event::TaskCancelled { task_id });
            }
            TaskStatus::Failed => {
                error!(
                    task_id = %task_id,
                    name = %result.name,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Task failed"
                );
                this.notifier.notify(Event::TaskFailed {
                    task_id,
                    error: result.error.clone().unwrap_or_default(),
                    details: result.error_details.clone(),
                });
            }
            _ => {}
        }
        this.notifier.notify(Event::TaskCompleted(result.clone()));

        {
            let mut history = this.history.lock();
            if history.len() == this.history_capacity {
                history.pop_front();
            }
            history.push_back(result);
        }
        this.active.remove(&task_id);
        this.finished.notify_waiters();

        if ran.is_some() {
            this.release_slot();
            Self::dispatch(this);
        }
    }

    fn release_slot(&self) {
        let mut scheduler = self.scheduler.lock();
        scheduler.running = scheduler.running.saturating_sub(1);
    }
}

fn outcome_of(joined: Result<anyhow::Result<Value>, JoinError>, cancelled: bool) -> Outcome {
    match joined {
        Ok(_) if cancelled => Outcome::Cancelled(None),
        Ok(Ok(value)) => Outcome::Completed(value),
        Ok(Err(err)) => Outcome::Failed {
            error: err.to_string(),
            details: format!("{err:?}"),
        },
        Err(join_err) if join_err.is_panic() => {
            let panic = join_err.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Outcome::Failed {
                error: format!("Task panicked: {message}"),
                details: format!("{}: {message}", ErrorKind::TaskException.code()),
            }
        }
        Err(join_err) => Outcome::Failed {
            error: format!("Task aborted: {join_err}"),
            details: ErrorKind::TaskException.code().to_string(),
        },
    }
}
