//! The unit of work run by the executor.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use super::context::TaskContext;
use crate::domain::TaskPriority;

/// A unit of background work.
///
/// Cancellation is cooperative: `execute` should poll
/// [`TaskContext::is_cancelled`] at safe points. A worker that never does
/// runs to completion even after it was cancelled.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Display name used in events and logs.
    fn name(&self) -> String;

    fn priority(&self) -> TaskPriority {
        TaskPriority::Normal
    }

    /// Run the work. Errors and panics are contained by the executor and
    /// turned into a failed result.
    async fn execute(&self, ctx: TaskContext) -> anyhow::Result<Value>;
}

/// Worker backed by a closure.
pub struct FnWorker<F> {
    name: String,
    priority: TaskPriority,
    run: F,
}

/// Wrap an async closure as a [`Worker`].
pub fn from_fn<F, Fut>(name: impl Into<String>, run: F) -> FnWorker<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    FnWorker {
        name: name.into(),
        priority: TaskPriority::Normal,
        run,
    }
}

impl<F> FnWorker<F> {
    #[must_use]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl<F, Fut> Worker for FnWorker<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn priority(&self) -> TaskPriority {
        self.priority
    }

    async fn execute(&self, ctx: TaskContext) -> anyhow::Result<Value> {
        (self.run)(ctx).await
    }
}
