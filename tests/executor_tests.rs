mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use support::harness;
use tallybridge::application::executor::{
    from_fn, ConnectionTestJob, DataLoadJob, ExecutorConfig, PostVoucherJob, TaskContext,
    TaskExecutor, Worker,
};
use tallybridge::domain::{DataType, RequestParams, TaskId, TaskPriority, TaskStatus};
use tallybridge::port::Notifier;
use tallybridge::testkit::config;
use tallybridge::testkit::fixtures;
use tallybridge::testkit::notifier::RecordingNotifier;
use tallybridge::testkit::transport::ScriptedTransport;
use tallybridge::Error;
use tokio::sync::Semaphore;

fn executor_with(cfg: &ExecutorConfig) -> (TaskExecutor, RecordingNotifier) {
    let events = RecordingNotifier::new();
    let notifier: Arc<dyn Notifier> = Arc::new(events.clone());
    let executor = TaskExecutor::new(cfg, notifier).expect("executor");
    (executor, events)
}

fn executor(width: usize) -> (TaskExecutor, RecordingNotifier) {
    executor_with(&config::executor(width))
}

/// Holds its slot until the gate opens.
fn gated(name: &str, gate: Arc<Semaphore>) -> impl Worker {
    from_fn(name, move |_ctx| {
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate.acquire().await?;
            Ok::<_, anyhow::Error>(Value::Null)
        }
    })
}

struct Panicking;

#[async_trait]
impl Worker for Panicking {
    fn name(&self) -> String {
        "Panicking".to_string()
    }

    async fn execute(&self, _ctx: TaskContext) -> anyhow::Result<Value> {
        panic!("ledger index corrupted");
    }
}

#[tokio::test]
async fn lifecycle_events_end_with_completed() {
    let (executor, events) = executor(2);

    let id = executor.submit(from_fn("Sum", |ctx: TaskContext| async move {
        ctx.report_progress(50, "halfway");
        ctx.report_progress(150, "clamped");
        Ok::<_, anyhow::Error>(json!({ "sum": 3 }))
    }));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Completed);
    assert!(result.is_success());
    assert_eq!(result.name, "Sum");
    assert_eq!(result.data, Some(json!({ "sum": 3 })));
    assert!(result.started_at.is_some());
    assert_eq!(
        events.task_events(id),
        ["added", "started", "progress", "progress", "completed"]
    );
    assert_eq!(executor.status(id), Some(TaskStatus::Completed));
    assert!(executor.active_tasks().is_empty());
}

#[tokio::test]
async fn errors_become_failed_results() {
    let (executor, events) = executor(2);

    let id = executor.submit(from_fn("Locked", |_ctx| async {
        Err::<Value, _>(anyhow::anyhow!("ledger locked"))
    }));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("ledger locked"));
    assert!(result.data.is_none());
    assert_eq!(events.task_events(id), ["added", "started", "failed", "completed"]);
}

#[tokio::test]
async fn panics_are_contained() {
    let (executor, events) = executor(2);

    let id = executor.submit(Panicking);
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(
        result.error.as_deref(),
        Some("Task panicked: ledger index corrupted")
    );
    assert_eq!(
        result.error_details.as_deref(),
        Some("TASK_EXCEPTION: ledger index corrupted")
    );
    assert_eq!(events.task_events(id).last(), Some(&"completed"));

    // The slot was released.
    let next = executor.submit(from_fn("After", |_ctx| async {
        Ok::<_, anyhow::Error>(Value::Null)
    }));
    assert!(executor.wait(next).await.expect("result").is_success());
}

#[tokio::test]
async fn running_task_cancels_cooperatively() {
    let (executor, events) = executor(2);

    let id = executor.submit(from_fn("Long", |ctx: TaskContext| async move {
        ctx.report_progress(10, "started");
        while !ctx.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok::<_, anyhow::Error>(json!("partial"))
    }));
    while executor.status(id) != Some(TaskStatus::Running) {
        tokio::task::yield_now().await;
    }

    assert!(executor.cancel(id));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Cancelled);
    assert!(result.data.is_none());
    let labels = events.task_events(id);
    assert_eq!(labels.first(), Some(&"added"));
    assert!(labels.contains(&"started"));
    assert!(!labels.contains(&"failed"));
    assert_eq!(&labels[labels.len() - 2..], ["cancelled", "completed"]);
    assert!(!executor.cancel(id));
}

#[tokio::test]
async fn pending_task_is_dropped_without_starting() {
    let (executor, events) = executor(1);
    let gate = Arc::new(Semaphore::new(0));

    let blocker = executor.submit(gated("Blocker", Arc::clone(&gate)));
    let queued = executor.submit(from_fn("Queued", |_ctx| async {
        Ok::<_, anyhow::Error>(Value::Null)
    }));
    assert_eq!(executor.status(queued), Some(TaskStatus::Pending));
    assert_eq!(executor.pending_count(), 1);

    assert!(executor.cancel(queued));
    gate.add_permits(1);
    executor.wait_idle().await;

    assert_eq!(events.task_events(queued), ["added", "cancelled", "completed"]);
    let result = executor.result(queued).expect("result");
    assert_eq!(result.status, TaskStatus::Cancelled);
    assert!(result.started_at.is_none());
    assert_eq!(executor.status(blocker), Some(TaskStatus::Completed));
}

#[tokio::test]
async fn wait_resolves_only_once_the_task_finishes() {
    let (executor, _events) = executor(1);
    let gate = Arc::new(Semaphore::new(0));
    let id = executor.submit(gated("Blocker", Arc::clone(&gate)));

    let mut waiting = tokio_test::task::spawn(executor.wait(id));
    tokio_test::assert_pending!(waiting.poll());

    gate.add_permits(1);
    executor.wait_idle().await;

    let result = tokio_test::assert_ready!(waiting.poll()).expect("result");
    assert_eq!(result.status, TaskStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_never_exceeds_the_pool_width() {
    let (executor, _events) = executor(2);
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let ids: Vec<TaskId> = (0..6)
        .map(|i| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            executor.submit(from_fn(format!("Job {i}"), move |_ctx| {
                let current = Arc::clone(&current);
                let peak = Arc::clone(&peak);
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(Value::Null)
                }
            }))
        })
        .collect();

    for id in ids {
        assert!(executor.wait(id).await.expect("result").is_success());
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(executor.peak_running() <= 2);
    assert_eq!(executor.running_count(), 0);
    assert_eq!(executor.task_history(10).len(), 6);
}

#[tokio::test]
async fn higher_priority_is_admitted_first() {
    let (executor, _events) = executor(1);
    let gate = Arc::new(Semaphore::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));

    executor.submit(gated("Blocker", Arc::clone(&gate)));
    for (name, priority) in [
        ("low", TaskPriority::Low),
        ("critical", TaskPriority::Critical),
        ("normal-1", TaskPriority::Normal),
        ("normal-2", TaskPriority::Normal),
    ] {
        let order = Arc::clone(&order);
        executor.submit(
            from_fn(name, move |_ctx| {
                let order = Arc::clone(&order);
                async move {
                    order.lock().push(name);
                    Ok::<_, anyhow::Error>(Value::Null)
                }
            })
            .with_priority(priority),
        );
    }

    gate.add_permits(1);
    executor.wait_idle().await;

    assert_eq!(*order.lock(), ["critical", "normal-1", "normal-2", "low"]);
}

#[tokio::test]
async fn overdue_tasks_are_cancelled() {
    let cfg = ExecutorConfig {
        task_timeout_ms: Some(50),
        ..config::executor(2)
    };
    let (executor, events) = executor_with(&cfg);

    let id = executor.submit(from_fn("Stuck", |ctx: TaskContext| async move {
        ctx.cancelled().await;
        Ok::<_, anyhow::Error>(Value::Null)
    }));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Cancelled);
    assert_eq!(result.error.as_deref(), Some("Timed out after 50 ms"));
    assert_eq!(events.task_events(id).last(), Some(&"completed"));
}

#[tokio::test]
async fn snapshots_show_live_progress() {
    let (executor, _events) = executor(1);
    let gate = Arc::new(Semaphore::new(0));

    let worker_gate = Arc::clone(&gate);
    let id = executor.submit(from_fn("Report", move |ctx: TaskContext| {
        let gate = Arc::clone(&worker_gate);
        async move {
            ctx.report_progress(40, "reading ledgers");
            let _permit = gate.acquire().await?;
            Ok::<_, anyhow::Error>(Value::Null)
        }
    }));

    let mut snapshot = None;
    for _ in 0..200 {
        let tasks = executor.active_tasks();
        if tasks.first().is_some_and(|t| t.progress.percentage == 40) {
            snapshot = tasks.into_iter().next();
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let snapshot = snapshot.expect("progress reported");
    assert_eq!(snapshot.task_id, id);
    assert_eq!(snapshot.status, TaskStatus::Running);
    assert_eq!(snapshot.progress.message, "reading ledgers");

    gate.add_permits(1);
    executor.wait(id).await;
}

#[tokio::test]
async fn history_is_newest_first_and_bounded() {
    let cfg = ExecutorConfig {
        history_capacity: 2,
        ..config::executor(1)
    };
    let (executor, _events) = executor_with(&cfg);

    for name in ["first", "second", "third"] {
        let id = executor.submit(from_fn(name, |_ctx| async {
            Ok::<_, anyhow::Error>(Value::Null)
        }));
        executor.wait(id).await;
    }

    let names: Vec<String> = executor
        .task_history(10)
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["third", "second"]);
    assert_eq!(executor.task_history(1).len(), 1);
}

#[tokio::test]
async fn cancel_all_reaches_pending_and_running() {
    let (executor, _events) = executor(1);
    let gate = Arc::new(Semaphore::new(0));

    let running = executor.submit(from_fn("Running", |ctx: TaskContext| async move {
        ctx.cancelled().await;
        Ok::<_, anyhow::Error>(Value::Null)
    }));
    let pending = executor.submit(gated("Pending", Arc::clone(&gate)));

    assert_eq!(executor.cancel_all(), 2);
    executor.wait_idle().await;

    assert_eq!(executor.status(running), Some(TaskStatus::Cancelled));
    assert_eq!(executor.status(pending), Some(TaskStatus::Cancelled));
}

#[tokio::test]
async fn unknown_tasks_are_not_waited_on() {
    let (executor, _events) = executor(1);
    assert!(executor.wait(TaskId::new()).await.is_none());
    assert!(!executor.cancel(TaskId::new()));
    assert_eq!(executor.status(TaskId::new()), None);
}

#[test]
fn executor_requires_a_runtime() {
    let result = TaskExecutor::new(&config::executor(1), Arc::new(RecordingNotifier::new()));
    assert!(matches!(result, Err(Error::Runtime(_))));
}

#[test]
fn zero_width_is_rejected() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let _guard = runtime.enter();
    let result = TaskExecutor::new(&config::executor(0), Arc::new(RecordingNotifier::new()));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn data_load_job_connects_then_loads() {
    let h = harness(
        ScriptedTransport::new()
            .ok(fixtures::PROBE_OK)
            .ok(fixtures::COMPANY_INFO)
            .ok(fixtures::LEDGER_LIST),
    );
    let (executor, events) = executor(2);

    let id = executor.submit(DataLoadJob::new(
        Arc::clone(&h.reader),
        DataType::LedgerList,
        RequestParams::new(),
    ));
    let result = executor.wait(id).await.expect("result");

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.name, "Load Ledger List");
    let data = result.data.expect("data");
    assert_eq!(data["data_type"], "ledger_list");
    assert_eq!(data["from_cache"], false);
    assert_eq!(data["payload"]["kind"], "document");
    assert!(h.connection.is_connected());
    assert_eq!(
        events.task_events(id),
        ["added", "started", "progress", "progress", "progress", "progress", "completed"]
    );
}

#[tokio::test]
async fn data_load_job_fails_when_the_gateway_is_down() {
    let h = harness(ScriptedTransport::new());
    let (executor, _events) = executor(2);

    let id = executor.submit(DataLoadJob::new(
        Arc::clone(&h.reader),
        DataType::LedgerList,
        RequestParams::new(),
    ));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.status, TaskStatus::Failed);
    assert!(result
        .error
        .is_some_and(|e| e.starts_with("Cannot reach gateway")));
}

#[tokio::test]
async fn connection_test_job_reports_the_company() {
    let h = harness(
        ScriptedTransport::new()
            .ok(fixtures::PROBE_OK)
            .ok(fixtures::COMPANY_INFO),
    );
    let (executor, _events) = executor(2);

    let id = executor.submit(ConnectionTestJob::new(Arc::clone(&h.connection)));
    let result = executor.wait(id).await.expect("result");

    let data = result.data.expect("data");
    assert_eq!(data["message"], "Connected to Acme Traders");
    assert_eq!(data["company"]["name"], "Acme Traders");
}

#[tokio::test]
async fn post_voucher_job_surfaces_the_summary() {
    let h = harness(ScriptedTransport::new().ok(fixtures::IMPORT_MISSING_LEDGER));
    let (executor, _events) = executor(2);

    let id = executor.submit(PostVoucherJob::new(
        Arc::clone(&h.reader),
        fixtures::VOUCHER_BALANCED,
        "rent",
    ));
    let result = executor.wait(id).await.expect("result");

    assert_eq!(result.name, "Post rent");
    assert_eq!(result.status, TaskStatus::Failed);
    assert!(result
        .error
        .is_some_and(|e| e.contains("Could not find Ledger 'Shop Rent'")));
}
