//! # charter
//!
//! Charter governs project specifications against a declared rule set (a
//! *constitution*) and tracks task completion across an initiative.
//!
//! 1. **Parsers** - Turn constitution, specification and task markdown into
//!    structured values
//! 2. **Validator** - Scores a specification against a constitution and
//!    reports categorized issues
//! 3. **Progress Tracker** - Keeps per-task completion state, reads and writes
//!    progress reports, and advances tasks from commit history
//!
//! ## Features
//!
//! - **Permissive Parsing**: Missing or malformed sections degrade to empty fields
//! - **Rule Registry**: Rule checks are looked up by category and id, so new
//!   rules need no changes to the validator
//! - **Markdown Round Trip**: Progress reports re-parse into the same completed set
//! - **Git Mining**: `fixes P1-003` in a commit completes task P1-003
//! - **Background Sync**: A cancellable watcher polls commit history
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use charter::{parse_constitution, parse_spec, parse_tasks, ProgressTracker, SpecValidator};
//! use charter::tracker::GitSyncOptions;
//!
//! #[tokio::main]
//! async fn main() -> charter::Result<()> {
//!     let read = |path: &str| std::fs::read_to_string(path).unwrap_or_default();
//!     let constitution = parse_constitution(&read("constitution.md"));
//!     let spec = parse_spec(&read("spec.md"));
//!
//!     let report = SpecValidator::new(constitution).generate_report(&spec);
//!     println!("{}", charter::format_report_as_markdown(&report));
//!
//!     let tasks = parse_tasks(&read("tasks.md"));
//!     let mut tracker = ProgressTracker::new(&tasks);
//!     tracker.sync_from_git(&GitSyncOptions::new().repo_path(".")).await;
//!     tracker.save_progress("progress.md").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! constitution.md → ConstitutionParser ─┐
//!                                       ├→ SpecValidator → ValidationReport
//! spec.md ────────→ SpecParser ─────────┘
//!
//! tasks.md ───────→ TasksParser → ProgressTracker ←── git log
//!                                       ↓
//!                                  progress.md
//! ```

pub mod error;
pub mod models;
pub mod parsers;
pub mod tracker;
pub mod validator;

// Re-export main types for convenience
pub use error::{CharterError, Result};
pub use models::{
    // Config types
    CharterConfig,
    CharterConfigBuilder,
    ValidationError,
    MAX_POLL_INTERVAL_MS,
    MIN_POLL_INTERVAL_MS,
    VALID_LOG_LEVELS,
    // Constitution types
    Constitution,
    ConstitutionMetadata,
    ConstraintSeverity,
    RuleCategory,
    RuleItem,
    // Spec types
    Objective,
    Requirement,
    RequirementType,
    SpecContent,
    // Task types
    DerivedTask,
    Priority,
    Tasks,
    TasksMetadata,
    // Validation types
    CategoryBreakdown,
    CategoryBreakdowns,
    IssueConstraint,
    IssueSeverity,
    ValidationIssue,
    ValidationReport,
    ValidationResult,
    // Progress types
    CompletionStats,
    ProgressIndicator,
    ProgressStatus,
    TaskProgressUpdate,
    TaskState,
    TaskStatus,
};
pub use parsers::{
    parse_constitution, parse_spec, parse_tasks, parse_tasks_strict, ConstitutionParser,
    DocumentParser, SpecParser, TasksParser,
};
pub use tracker::{watch_and_sync, GitSyncOptions, ProgressTracker, SyncWatcher, WatchOptions};
pub use validator::{format_report_as_markdown, RuleRegistry, SpecValidator};
