//! Commit-history mining.
//!
//! Commits are listed through a [`CommitSource`]; the default [`GitCli`]
//! shells out to `git log` with a fixed format. Listing fails soft: any
//! problem running git yields an empty list and a warning, so progress
//! tracking keeps working outside a repository.

use crate::error::{CharterError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::process::Command;

/// `git log` format: hash, subject, ISO author date, author name.
pub const LOG_FORMAT: &str = "%H|%s|%aI|%an";

/// Length of the abbreviated hash recorded in notes.
pub const SHORT_HASH_LEN: usize = 7;

static ACTION_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(close|fix|resolve|complete)(?:s|es)?\b[\s:#]+((?-i:[A-Z0-9]+-\d+))\b")
        .expect("valid action reference regex")
});

static TASK_ID_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z0-9]+-\d+\b").expect("valid task id regex"));

/// Options for one commit-history pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitSyncOptions {
    /// Working directory for git; the process directory when unset
    pub repo_path: Option<PathBuf>,
    /// Revision to list instead of `HEAD`
    pub branch: Option<String>,
    /// Only commits after this time
    pub since: Option<DateTime<Utc>>,
    /// Extra regex whose matches count as in-progress references. The first
    /// capture group is the task id, or the whole match without groups.
    pub task_id_pattern: Option<String>,
}

impl GitSyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn task_id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.task_id_pattern = Some(pattern.into());
        self
    }

    /// Compile the custom pattern, if any.
    pub fn compile_pattern(&self) -> Result<Option<Regex>> {
        self.task_id_pattern
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern)
                    .map_err(|e| CharterError::invalid_pattern(pattern, e.to_string()))
            })
            .transpose()
    }

    /// Compiled custom pattern; an invalid pattern is logged and ignored.
    pub(crate) fn pattern_or_warn(&self) -> Option<Regex> {
        self.compile_pattern().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring custom task id pattern");
            None
        })
    }

    pub(crate) fn repo_dir(&self) -> &Path {
        self.repo_path.as_deref().unwrap_or(Path::new("."))
    }
}

/// One commit from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub author: String,
}

impl CommitRecord {
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(SHORT_HASH_LEN)
            .map_or(self.hash.len(), |(i, _)| i);
        &self.hash[..end]
    }
}

/// How a commit message refers to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitAction {
    Close,
    Fix,
    Resolve,
    Complete,
    /// Matched by the caller-supplied pattern
    Custom,
    /// Bare task id anywhere in the message
    Mention,
}

impl CommitAction {
    /// Whether the reference marks the task as done.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            CommitAction::Close | CommitAction::Fix | CommitAction::Resolve | CommitAction::Complete
        )
    }

    fn from_verb(verb: &str) -> Option<Self> {
        match verb.to_ascii_lowercase().as_str() {
            "close" => Some(CommitAction::Close),
            "fix" => Some(CommitAction::Fix),
            "resolve" => Some(CommitAction::Resolve),
            "complete" => Some(CommitAction::Complete),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommitAction::Close => "close",
            CommitAction::Fix => "fix",
            CommitAction::Resolve => "resolve",
            CommitAction::Complete => "complete",
            CommitAction::Custom => "custom",
            CommitAction::Mention => "mention",
        };
        f.write_str(name)
    }
}

/// A task id found in a commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReference {
    pub task_id: String,
    pub action: CommitAction,
}

/// Find task references in a commit message.
///
/// Each id is reported once. Action phrases ("fixes P4-001") win over a
/// custom-pattern match, which wins over a bare mention.
pub fn extract_task_references(message: &str, custom: Option<&Regex>) -> Vec<TaskReference> {
    let mut seen = HashSet::new();
    let mut references = Vec::new();
    let mut push = |task_id: &str, action: CommitAction| {
        if seen.insert(task_id.to_string()) {
            references.push(TaskReference {
                task_id: task_id.to_string(),
                action,
            });
        }
    };

    for caps in ACTION_REFERENCE.captures_iter(message) {
        if let Some(action) = CommitAction::from_verb(&caps[1]) {
            push(&caps[2], action);
        }
    }

    if let Some(pattern) = custom {
        for caps in pattern.captures_iter(message) {
            if let Some(id) = caps.get(1).or_else(|| caps.get(0)) {
                push(id.as_str(), CommitAction::Custom);
            }
        }
    }

    for mention in TASK_ID_MENTION.find_iter(message) {
        push(mention.as_str(), CommitAction::Mention);
    }

    references
}

/// Parse `git log --pretty=format:<LOG_FORMAT>` output, newest first as
/// printed. Malformed lines are skipped.
pub fn parse_log_output(output: &str) -> Vec<CommitRecord> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let record = parse_log_line(line);
            if record.is_none() {
                tracing::debug!(line, "Skipping malformed log line");
            }
            record
        })
        .collect()
}

fn parse_log_line(line: &str) -> Option<CommitRecord> {
    let (hash, rest) = line.split_once('|')?;
    let mut tail = rest.rsplitn(3, '|');
    let author = tail.next()?;
    let date = tail.next()?;
    let subject = tail.next()?;

    let date = DateTime::parse_from_rfc3339(date.trim()).ok()?.with_timezone(&Utc);
    Some(CommitRecord {
        hash: hash.trim().to_string(),
        subject: subject.to_string(),
        date,
        author: author.trim().to_string(),
    })
}

/// A provider of commit history.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Commits matching `options`, newest first. Never fails; problems
    /// yield an empty list.
    async fn list_commits(&self, options: &GitSyncOptions) -> Vec<CommitRecord>;
}

/// Lists commits by running the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to git for `options`.
    pub fn log_args(options: &GitSyncOptions) -> Vec<String> {
        let mut args = vec![
            "log".to_string(),
            format!("--pretty=format:{}", LOG_FORMAT),
            "--no-merges".to_string(),
        ];
        if let Some(since) = options.since {
            args.push(format!("--since={}", since.to_rfc3339()));
        }
        if let Some(branch) = &options.branch {
            if branch.starts_with('-') {
                tracing::warn!(branch = %branch, "Ignoring branch that looks like an option");
            } else {
                args.push(branch.clone());
            }
        }
        args
    }

    async fn run_log(&self, options: &GitSyncOptions) -> std::result::Result<String, String> {
        let output = Command::new(&self.program)
            .args(Self::log_args(options))
            .current_dir(options.repo_dir())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("Failed to run git: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git log failed ({}): {}", output.status, stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl CommitSource for GitCli {
    async fn list_commits(&self, options: &GitSyncOptions) -> Vec<CommitRecord> {
        match self.run_log(options).await {
            Ok(stdout) => parse_log_output(&stdout),
            Err(message) => {
                tracing::warn!(
                    repo = %options.repo_dir().display(),
                    error = %message,
                    "Commit history unavailable"
                );
                Vec::new()
            }
        }
    }
}
