//! Background task identity, lifecycle and results.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Unique identifier returned by task submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(Uuid);

impl TaskId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Task lifecycle. Moves strictly forward; terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission priority of pending tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Latest progress reported by a running task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    /// Always within `0..=100`.
    pub percentage: u8,
    pub message: String,
}

impl TaskProgress {
    pub fn new(percentage: i32, message: impl Into<String>) -> Self {
        Self {
            percentage: u8::try_from(percentage.clamp(0, 100)).unwrap_or(100),
            message: message.into(),
        }
    }
}

/// Terminal outcome of a task, produced exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub name: String,
    pub status: TaskStatus,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub error_details: Option<String>,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// View of a task that has not finished yet.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub name: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub progress: TaskProgress,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(value.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(TaskProgress::new(-5, "x").percentage, 0);
        assert_eq!(TaskProgress::new(250, "x").percentage, 100);
        assert_eq!(TaskProgress::new(42, "x").percentage, 42);
    }

    #[test]
    fn priority_order() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
