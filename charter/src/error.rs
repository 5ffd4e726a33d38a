//! Error types for the charter governance toolkit.
//!
//! Parsing and validation never fail; errors surface only from tracker misuse,
//! explicit file operations, and configuration.

use crate::models::config::ValidationError;
use std::path::Path;
use thiserror::Error;

/// Result type alias for charter operations.
pub type Result<T> = std::result::Result<T, CharterError>;

/// Errors that can occur in the charter toolkit.
#[derive(Debug, Error)]
pub enum CharterError {
    /// A progress update referenced a task id the tracker was not seeded with
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The strict tasks parser found the same id twice
    #[error("Duplicate task ID: {0}")]
    DuplicateTask(String),

    /// File I/O error, with the path that failed
    #[error("File error ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A caller-supplied task id pattern failed to compile
    #[error("Invalid task id pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Configuration validation error with detailed context
    #[error("Configuration validation error: {0}")]
    ConfigValidation(#[from] ValidationError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CharterError {
    /// Create an I/O error tagged with the path being accessed.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CharterError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, msg: impl Into<String>) -> Self {
        CharterError::InvalidPattern {
            pattern: pattern.into(),
            message: msg.into(),
        }
    }

    /// Whether this error is the tracker's unknown-task misuse error.
    pub fn is_unknown_task(&self) -> bool {
        matches!(self, CharterError::UnknownTask(_))
    }
}

impl From<serde_json::Error> for CharterError {
    fn from(err: serde_json::Error) -> Self {
        CharterError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for CharterError {
    fn from(err: toml::de::Error) -> Self {
        CharterError::Serialization(err.to_string())
    }
}
