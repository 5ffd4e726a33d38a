//! Configuration management for the charter toolkit.
//!
//! Configuration covers where the governed documents live, which repository
//! commit history is mined from, and how often the watcher polls.
//!
//! ## Validation
//!
//! All configuration is validated on load to fail fast with descriptive errors.
//! Use `CharterConfig::from_env()` to load from `CHARTER_*` environment
//! variables, `CharterConfig::from_toml_file()` for a config file, or the
//! builder with `.build()` for programmatic configuration.

use crate::error::{CharterError, Result};
use crate::tracker::GitSyncOptions;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lowest accepted watcher poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

/// Highest accepted watcher poll interval (one day).
pub const MAX_POLL_INTERVAL_MS: u64 = 86_400_000;

/// Accepted log levels.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A configuration value rejected by [`CharterConfig::validate`].
///
/// `field` uses the TOML key name; `suggestion` names an accepted value or
/// the environment variable to set.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::error::Error for ValidationError {}

/// Main configuration for the charter toolkit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharterConfig {
    /// Path to the constitution markdown
    #[serde(default = "default_constitution_path")]
    pub constitution_path: String,
    /// Path to the specification markdown
    #[serde(default = "default_spec_path")]
    pub spec_path: String,
    /// Path to the tasks markdown
    #[serde(default = "default_tasks_path")]
    pub tasks_path: String,
    /// Path to the progress report markdown
    #[serde(default = "default_progress_path")]
    pub progress_path: String,
    /// Repository whose commit history is mined
    #[serde(default = "default_repo_path")]
    pub repo_path: String,
    /// Branch or revision passed to the log query
    #[serde(default)]
    pub branch: Option<String>,
    /// Extra regex for task references in commit messages
    #[serde(default)]
    pub task_id_pattern: Option<String>,
    /// Watcher poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_constitution_path() -> String {
    "constitution.md".to_string()
}

fn default_spec_path() -> String {
    "spec.md".to_string()
}

fn default_tasks_path() -> String {
    "tasks.md".to_string()
}

fn default_progress_path() -> String {
    "progress.md".to_string()
}

fn default_repo_path() -> String {
    ".".to_string()
}

fn default_poll_interval_ms() -> u64 {
    60_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CharterConfig {
    fn default() -> Self {
        Self {
            constitution_path: default_constitution_path(),
            spec_path: default_spec_path(),
            tasks_path: default_tasks_path(),
            progress_path: default_progress_path(),
            repo_path: default_repo_path(),
            branch: None,
            task_id_pattern: None,
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl CharterConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CharterConfigBuilder {
        CharterConfigBuilder::default()
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// ## Environment Variables
    ///
    /// - `CHARTER_CONSTITUTION_PATH` - Constitution file (default: constitution.md)
    /// - `CHARTER_SPEC_PATH` - Specification file (default: spec.md)
    /// - `CHARTER_TASKS_PATH` - Tasks file (default: tasks.md)
    /// - `CHARTER_PROGRESS_PATH` - Progress report file (default: progress.md)
    /// - `CHARTER_REPO_PATH` - Repository to mine (default: .)
    /// - `CHARTER_BRANCH` - Branch for the log query (default: current HEAD)
    /// - `CHARTER_TASK_ID_PATTERN` - Extra task reference regex
    /// - `CHARTER_POLL_INTERVAL_MS` - Watcher interval (default: 60000)
    /// - `CHARTER_LOG_LEVEL` - Log level (default: info)
    pub fn from_env() -> std::result::Result<Self, ValidationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, using the same keys as
    /// [`CharterConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file; `CHARTER_*` variables still win.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CharterError::io(path, e))?;
        let mut config: CharterConfig = toml::from_str(&content)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> std::result::Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CHARTER_CONSTITUTION_PATH") {
            self.constitution_path = path;
        }
        if let Some(path) = lookup("CHARTER_SPEC_PATH") {
            self.spec_path = path;
        }
        if let Some(path) = lookup("CHARTER_TASKS_PATH") {
            self.tasks_path = path;
        }
        if let Some(path) = lookup("CHARTER_PROGRESS_PATH") {
            self.progress_path = path;
        }
        if let Some(path) = lookup("CHARTER_REPO_PATH") {
            self.repo_path = path;
        }
        if let Some(branch) = lookup("CHARTER_BRANCH") {
            self.branch = Some(branch).filter(|b| !b.is_empty());
        }
        if let Some(pattern) = lookup("CHARTER_TASK_ID_PATTERN") {
            self.task_id_pattern = Some(pattern).filter(|p| !p.is_empty());
        }
        if let Some(interval) = lookup("CHARTER_POLL_INTERVAL_MS") {
            self.poll_interval_ms = interval.parse().map_err(|e| {
                ValidationError::new(
                    "poll_interval_ms",
                    format!("Invalid CHARTER_POLL_INTERVAL_MS '{}': {}", interval, e),
                )
                .with_suggestion("Use a positive integer number of milliseconds like 60000")
            })?;
        }
        if let Some(level) = lookup("CHARTER_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validate the configuration settings.
    ///
    /// Checks paths, the poll interval bounds, the log level, and that a
    /// custom task id pattern compiles.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_path("constitution_path", &self.constitution_path)?;
        validate_path("spec_path", &self.spec_path)?;
        validate_path("tasks_path", &self.tasks_path)?;
        validate_path("progress_path", &self.progress_path)?;
        validate_path("repo_path", &self.repo_path)?;

        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ValidationError::new(
                "poll_interval_ms",
                format!(
                    "Poll interval {}ms is outside {}..={}",
                    self.poll_interval_ms, MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS
                ),
            )
            .with_suggestion("Use a value like 60000 (one minute)"));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::new(
                "log_level",
                format!("Invalid log level '{}'", self.log_level),
            )
            .with_suggestion(format!("Valid log levels: {:?}", VALID_LOG_LEVELS)));
        }

        if let Some(ref pattern) = self.task_id_pattern {
            if let Err(e) = Regex::new(pattern) {
                return Err(ValidationError::new(
                    "task_id_pattern",
                    format!("Pattern '{}' does not compile: {}", pattern, e),
                )
                .with_suggestion("Use a regex with one capture group, e.g. 'refs ([A-Z]+-\\d+)'"));
            }
        }

        if let Some(ref branch) = self.branch {
            if branch.starts_with('-') {
                return Err(ValidationError::new(
                    "branch",
                    format!("Branch '{}' looks like a command-line flag", branch),
                )
                .with_suggestion("Use a branch or revision name"));
            }
        }

        Ok(())
    }

    /// Watcher poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Git sync options derived from this configuration.
    pub fn sync_options(&self) -> GitSyncOptions {
        GitSyncOptions {
            repo_path: Some(PathBuf::from(&self.repo_path)),
            branch: self.branch.clone(),
            since: None,
            task_id_pattern: self.task_id_pattern.clone(),
        }
    }
}

/// Validate a file path configuration value.
fn validate_path(field: &str, path: &str) -> std::result::Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::new(field, "No document path configured")
            .with_suggestion(format!("Set CHARTER_{}", field.to_uppercase())));
    }
    if path.contains('\0') {
        return Err(ValidationError::new(
            field,
            format!("Path '{}' contains a NUL byte", path.escape_default()),
        ));
    }
    Ok(())
}

/// Builder for CharterConfig with fluent API.
#[derive(Debug, Clone, Default)]
pub struct CharterConfigBuilder {
    config: CharterConfig,
}

impl CharterConfigBuilder {
    /// Set the constitution file path.
    pub fn constitution_path(mut self, path: impl Into<String>) -> Self {
        self.config.constitution_path = path.into();
        self
    }

    /// Set the specification file path.
    pub fn spec_path(mut self, path: impl Into<String>) -> Self {
        self.config.spec_path = path.into();
        self
    }

    /// Set the tasks file path.
    pub fn tasks_path(mut self, path: impl Into<String>) -> Self {
        self.config.tasks_path = path.into();
        self
    }

    /// Set the progress file path.
    pub fn progress_path(mut self, path: impl Into<String>) -> Self {
        self.config.progress_path = path.into();
        self
    }

    /// Set the repository path.
    pub fn repo_path(mut self, path: impl Into<String>) -> Self {
        self.config.repo_path = path.into();
        self
    }

    /// Set the branch for the log query.
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = Some(branch.into());
        self
    }

    /// Set the custom task id pattern.
    pub fn task_id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.task_id_pattern = Some(pattern.into());
        self
    }

    /// Set the watcher poll interval.
    pub fn poll_interval_ms(mut self, interval: u64) -> Self {
        self.config.poll_interval_ms = interval;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Build the configuration, validating it first.
    pub fn build(self) -> std::result::Result<CharterConfig, ValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation.
    pub fn build_unchecked(self) -> CharterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = CharterConfig::default();
        assert_eq!(config.constitution_path, "constitution.md");
        assert_eq!(config.poll_interval_ms, 60_000);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CHARTER_TASKS_PATH", "plan/tasks.md"),
            ("CHARTER_POLL_INTERVAL_MS", "5000"),
            ("CHARTER_BRANCH", "main"),
        ]);
        let config = CharterConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.tasks_path, "plan/tasks.md");
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_lookup_rejects_bad_interval() {
        let err = CharterConfig::from_lookup(|k| {
            (k == "CHARTER_POLL_INTERVAL_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(err.field, "poll_interval_ms");
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("field", "message");
        assert_eq!(err.to_string(), "field: message");

        let err = ValidationError::new("field", "message").with_suggestion("try this");
        assert_eq!(err.to_string(), "field: message. try this");
    }
}
