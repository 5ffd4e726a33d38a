//! Task progress tracking.
//!
//! A [`ProgressTracker`] owns one [`TaskStatus`] per task it was seeded with.
//! State changes through explicit updates, by re-reading a progress report,
//! or by mining commit history ([`ProgressTracker::sync_from_git`]).
//!
//! The tracker is not internally synchronized. Share it behind a
//! `tokio::sync::Mutex` when a background watcher ([`watch_and_sync`]) is
//! running.
//!
//! # Example
//!
//! ```rust
//! use charter::models::TaskProgressUpdate;
//! use charter::parsers::parse_tasks;
//! use charter::tracker::ProgressTracker;
//!
//! let tasks = parse_tasks("### P1-001: Parse\n### P1-002: Validate\n");
//! let mut tracker = ProgressTracker::new(&tasks);
//! tracker.update_progress(TaskProgressUpdate::completed("P1-001")).unwrap();
//!
//! assert_eq!(tracker.calculate_completion().percent_complete, 50);
//! assert!(tracker.generate_progress_markdown().contains("- [x] **P1-001**: Parse"));
//! ```

pub mod git;
pub mod watch;

pub use git::{
    extract_task_references, parse_log_output, CommitAction, CommitRecord, CommitSource, GitCli,
    GitSyncOptions, TaskReference, LOG_FORMAT,
};
pub use watch::{watch_and_sync, PollReport, SyncWatcher, WatchOptions, DEFAULT_POLL_INTERVAL};

use crate::error::{CharterError, Result};
use crate::models::{
    CompletionStats, ProgressIndicator, ProgressStatus, TaskProgressUpdate, TaskState, TaskStatus,
    Tasks,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::Instrument;

static CHECKED_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s+\[[xX]\]\s+\*\*([^*]+)\*\*:").expect("valid checked task regex")
});

static NOTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+[-*]\s+Note:\s*(.*)$").expect("valid note regex"));

/// Per-task completion state for one task collection.
pub struct ProgressTracker {
    tasks: Tasks,
    statuses: IndexMap<String, TaskStatus>,
    commit_source: Arc<dyn CommitSource>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Seed a tracker with every task pending, reading history through `git`.
    pub fn new(tasks: &Tasks) -> Self {
        Self::with_commit_source(tasks, Arc::new(GitCli::new()))
    }

    /// Seed a tracker that reads commit history from `source`.
    ///
    /// Repeated ids share a single status entry.
    pub fn with_commit_source(tasks: &Tasks, source: Arc<dyn CommitSource>) -> Self {
        let duplicates = tasks.duplicate_ids();
        if !duplicates.is_empty() {
            tracing::warn!(?duplicates, "Task list repeats ids; tracking each once");
        }
        let statuses = tasks
            .items
            .iter()
            .map(|task| (task.id.clone(), TaskStatus::pending(&task.id)))
            .collect();
        Self {
            tasks: tasks.clone(),
            statuses,
            commit_source: source,
        }
    }

    pub fn tasks(&self) -> &Tasks {
        &self.tasks
    }

    /// Statuses in task order.
    pub fn statuses(&self) -> impl Iterator<Item = &TaskStatus> {
        self.statuses.values()
    }

    pub fn status(&self, task_id: &str) -> Option<&TaskStatus> {
        self.statuses.get(task_id)
    }

    pub fn commit_source(&self) -> Arc<dyn CommitSource> {
        Arc::clone(&self.commit_source)
    }

    /// Mark every checked `- [x] **ID**:` line of a progress report as
    /// completed. A `Note:` line indented under it restores the note.
    ///
    /// Every checked id known to the tracker is stamped with the current
    /// time, including tasks that were already completed. Unknown ids and
    /// unchecked boxes are ignored. Returns how many tasks were marked.
    pub fn load_progress(&mut self, markdown: &str) -> usize {
        let _span = charter_telemetry::parse_span("progress").entered();
        let now = Utc::now();
        let mut marked = 0;
        let mut lines = markdown.lines().peekable();

        while let Some(line) = lines.next() {
            let Some(caps) = CHECKED_TASK.captures(line) else {
                continue;
            };
            let id = caps[1].trim();
            let note = lines
                .peek()
                .and_then(|next| NOTE_LINE.captures(next))
                .map(|c| c[1].trim().to_string())
                .filter(|n| !n.is_empty());

            let Some(status) = self.statuses.get_mut(id) else {
                tracing::debug!(task_id = id, "Ignoring unknown task in progress report");
                continue;
            };
            status.transition(TaskState::Completed, now);
            if note.is_some() {
                status.set_notes(note);
            }
            marked += 1;
        }

        tracing::debug!(marked, "Loaded progress report");
        marked
    }

    /// Read a progress report from disk and load it.
    pub async fn load_progress_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CharterError::io(path, e))?;
        Ok(self.load_progress(&content))
    }

    /// Apply one update. Fails if the task id is unknown.
    pub fn update_progress(&mut self, update: TaskProgressUpdate) -> Result<()> {
        let status = self
            .statuses
            .get_mut(&update.task_id)
            .ok_or_else(|| CharterError::UnknownTask(update.task_id.clone()))?;

        status.transition(update.status.into(), update.timestamp.unwrap_or_else(Utc::now));
        status.set_notes(update.notes);

        tracing::info!(
            target: "charter.events",
            task_id = %update.task_id,
            status = %update.status,
            "Task progress updated"
        );
        Ok(())
    }

    /// Apply updates in order, stopping at the first unknown id. Updates
    /// before the failing one stay applied.
    pub fn update_multiple<I>(&mut self, updates: I) -> Result<usize>
    where
        I: IntoIterator<Item = TaskProgressUpdate>,
    {
        let mut applied = 0;
        for update in updates {
            self.update_progress(update)?;
            applied += 1;
        }
        Ok(applied)
    }

    pub fn calculate_completion(&self) -> CompletionStats {
        let completed = self.statuses.values().filter(|s| s.completed()).count();
        CompletionStats::from_counts(self.statuses.len(), completed)
    }

    /// Render the progress report, stamped with the current time.
    pub fn generate_progress_markdown(&self) -> String {
        self.render_progress_markdown(Utc::now())
    }

    /// Render the progress report stamped with `generated_at`.
    pub fn render_progress_markdown(&self, generated_at: DateTime<Utc>) -> String {
        let stats = self.calculate_completion();
        let indicator = ProgressIndicator::from_percent(stats.percent_complete);
        let mut md = String::new();

        md.push_str("# Progress Report\n\n");
        md.push_str(&format!(
            "**Last Updated**: {}\n",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str(&format!("**Status**: {}\n\n", indicator));

        md.push_str("## Summary\n\n");
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Total Tasks | {} |\n", stats.total));
        md.push_str(&format!("| Completed | {} |\n", stats.completed));
        md.push_str(&format!("| Remaining | {} |\n", stats.remaining));
        md.push_str(&format!("| Progress | {}% |\n\n", stats.percent_complete));

        md.push_str("## Tasks\n\n");
        for status in self.statuses.values() {
            let title = self
                .tasks
                .get(status.id())
                .map_or("", |task| task.title.as_str());
            let checkbox = if status.completed() { "[x]" } else { "[ ]" };
            md.push_str(&format!("- {} **{}**: {}", checkbox, status.id(), title));
            match status.state() {
                TaskState::InProgress => md.push_str(" _(in progress)_"),
                TaskState::Blocked => md.push_str(" _(blocked)_"),
                TaskState::Pending | TaskState::Completed => {}
            }
            md.push('\n');
            if let Some(notes) = status.notes() {
                md.push_str(&format!("  - Note: {}\n", notes));
            }
        }

        md
    }

    /// Write the rendered progress report to `path`.
    pub async fn save_progress(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.generate_progress_markdown())
            .await
            .map_err(|e| CharterError::io(path, e))
    }

    /// List commits and apply the task references they contain.
    ///
    /// Never fails: without git or a repository this returns no updates.
    pub async fn sync_from_git(&mut self, options: &GitSyncOptions) -> Vec<TaskProgressUpdate> {
        let since = options.since.map(|s| s.to_rfc3339());
        let span = charter_telemetry::git_sync_span(
            &options.repo_dir().display().to_string(),
            since.as_deref(),
        );
        let source = self.commit_source();
        let pattern = options.pattern_or_warn();

        async move {
            let commits = source.list_commits(options).await;
            self.apply_commits(&commits, pattern.as_ref())
        }
        .instrument(span)
        .await
    }

    /// Apply the task references of `commits` (newest first, as listed by
    /// git). Commits are applied oldest first so the newest reference wins.
    /// Any reference that is not a close/fix/resolve/complete action moves
    /// the task to in-progress, reopening it if it was completed.
    pub fn apply_commits(
        &mut self,
        commits: &[CommitRecord],
        custom: Option<&Regex>,
    ) -> Vec<TaskProgressUpdate> {
        let mut applied = Vec::new();

        for commit in commits.iter().rev() {
            for reference in extract_task_references(&commit.subject, custom) {
                if !self.statuses.contains_key(&reference.task_id) {
                    continue;
                }
                let completes = reference.action.is_completion();

                let update = TaskProgressUpdate {
                    task_id: reference.task_id,
                    status: if completes {
                        ProgressStatus::Completed
                    } else {
                        ProgressStatus::InProgress
                    },
                    notes: Some(format!("{} in commit {}", reference.action, commit.short_hash())),
                    timestamp: Some(commit.date),
                };
                if self.update_progress(update.clone()).is_ok() {
                    applied.push(update);
                }
            }
        }

        tracing::info!(
            target: "charter.events",
            commits = commits.len(),
            applied = applied.len(),
            "Git sync complete"
        );
        applied
    }
}
