//! Data models for the charter governance toolkit.
//!
//! This module contains:
//! - Constitution structures (rule categories and metadata)
//! - Specification content extracted from markdown
//! - Derived task collections
//! - Validation issues, results and reports
//! - Per-task progress state owned by the tracker
//! - Configuration management

pub mod config;
pub mod constitution;
pub mod progress;
pub mod spec;
pub mod tasks;
pub mod validation;

// Re-export public API
pub use config::{
    CharterConfig, CharterConfigBuilder, ValidationError, MAX_POLL_INTERVAL_MS,
    MIN_POLL_INTERVAL_MS, VALID_LOG_LEVELS,
};
pub use constitution::{
    ConstitutionMetadata, Constitution, ConstraintSeverity, RuleCategory, RuleItem,
};
pub use progress::{
    CompletionStats, ProgressIndicator, ProgressStatus, TaskProgressUpdate, TaskState, TaskStatus,
};
pub use spec::{Objective, Requirement, RequirementType, SpecContent};
pub use tasks::{DerivedTask, Priority, Tasks, TasksMetadata};
pub use validation::{
    CategoryBreakdown, CategoryBreakdowns, IssueConstraint, IssueSeverity, ValidationIssue,
    ValidationReport, ValidationResult,
};
