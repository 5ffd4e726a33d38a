//! Per-task progress state.
//!
//! [`TaskStatus`] values are owned by a `ProgressTracker`; they are created
//! when the tracker is seeded and only change through its update operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Not yet started
    #[default]
    Pending,
    /// Work has been reported on the task
    InProgress,
    /// Reported as blocked
    Blocked,
    /// Done
    Completed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::InProgress => write!(f, "in-progress"),
            TaskState::Blocked => write!(f, "blocked"),
            TaskState::Completed => write!(f, "completed"),
        }
    }
}

/// Status carried by a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    Completed,
    InProgress,
    Blocked,
}

impl From<ProgressStatus> for TaskState {
    fn from(status: ProgressStatus) -> Self {
        match status {
            ProgressStatus::Completed => TaskState::Completed,
            ProgressStatus::InProgress => TaskState::InProgress,
            ProgressStatus::Blocked => TaskState::Blocked,
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        TaskState::from(*self).fmt(f)
    }
}

/// Progress of a single task.
///
/// `completed` always equals `state == TaskState::Completed`, and
/// `completed_at` is only set while completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    id: String,
    completed: bool,
    state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl TaskStatus {
    /// A fresh, incomplete status.
    pub(crate) fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            completed: false,
            state: TaskState::Pending,
            completed_at: None,
            notes: None,
        }
    }

    /// Move to `state`; completion time is kept only for completed tasks.
    pub(crate) fn transition(&mut self, state: TaskState, at: DateTime<Utc>) {
        self.state = state;
        self.completed = state == TaskState::Completed;
        self.completed_at = self.completed.then_some(at);
    }

    pub(crate) fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// A requested change to one task's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressUpdate {
    pub task_id: String,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Completion time to record; defaults to now
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TaskProgressUpdate {
    pub fn new(task_id: impl Into<String>, status: ProgressStatus) -> Self {
        Self {
            task_id: task_id.into(),
            status,
            notes: None,
            timestamp: None,
        }
    }

    pub fn completed(task_id: impl Into<String>) -> Self {
        Self::new(task_id, ProgressStatus::Completed)
    }

    pub fn in_progress(task_id: impl Into<String>) -> Self {
        Self::new(task_id, ProgressStatus::InProgress)
    }

    pub fn blocked(task_id: impl Into<String>) -> Self {
        Self::new(task_id, ProgressStatus::Blocked)
    }

    /// Attach a free-text note.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Record an explicit completion time.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Completion counts across all tracked tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub percent_complete: u32,
}

impl CompletionStats {
    /// Derive remaining and rounded percentage; zero tasks is 0%.
    pub fn from_counts(total: usize, completed: usize) -> Self {
        let percent_complete = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            total,
            completed,
            remaining: total.saturating_sub(completed),
            percent_complete,
        }
    }
}

impl std::fmt::Display for CompletionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} tasks completed ({}%), {} remaining",
            self.completed, self.total, self.percent_complete, self.remaining
        )
    }
}

/// Banded status shown in the progress report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressIndicator {
    Complete,
    OnTrack,
    InProgress,
    EarlyStage,
    Starting,
}

impl ProgressIndicator {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            100.. => ProgressIndicator::Complete,
            75..=99 => ProgressIndicator::OnTrack,
            50..=74 => ProgressIndicator::InProgress,
            25..=49 => ProgressIndicator::EarlyStage,
            _ => ProgressIndicator::Starting,
        }
    }
}

impl std::fmt::Display for ProgressIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressIndicator::Complete => write!(f, "Complete"),
            ProgressIndicator::OnTrack => write!(f, "On Track"),
            ProgressIndicator::InProgress => write!(f, "In Progress"),
            ProgressIndicator::EarlyStage => write!(f, "Early Stage"),
            ProgressIndicator::Starting => write!(f, "Starting"),
        }
    }
}
