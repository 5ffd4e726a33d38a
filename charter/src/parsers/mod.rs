//! Markdown parsers for constitution, specification and task documents.
//!
//! All parsers are pure and permissive: malformed or missing sections degrade
//! to empty fields, never to errors. The one exception is
//! [`parse_tasks_strict`], which rejects duplicate task ids.

pub mod constitution;
pub mod section;
pub mod spec;
pub mod tasks;

pub use constitution::{constraint_severity, parse_constitution};
pub use spec::parse_spec;
pub use tasks::{parse_tasks, parse_tasks_strict};

use crate::models::{Constitution, SpecContent, Tasks};

/// A parser from markdown text to a structured document.
pub trait DocumentParser {
    type Output;

    /// Parse `content`. Never fails.
    fn parse(&self, content: &str) -> Self::Output;
}

/// Parses constitution documents into [`Constitution`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstitutionParser;

impl DocumentParser for ConstitutionParser {
    type Output = Constitution;

    fn parse(&self, content: &str) -> Constitution {
        parse_constitution(content)
    }
}

/// Parses specification documents into [`SpecContent`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecParser;

impl DocumentParser for SpecParser {
    type Output = SpecContent;

    fn parse(&self, content: &str) -> SpecContent {
        parse_spec(content)
    }
}

/// Parses task plans into [`Tasks`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasksParser;

impl DocumentParser for TasksParser {
    type Output = Tasks;

    fn parse(&self, content: &str) -> Tasks {
        parse_tasks(content)
    }
}

/// Read `path` and parse it with `parser`.
pub fn parse_file<P: DocumentParser>(
    parser: &P,
    path: impl AsRef<std::path::Path>,
) -> crate::Result<P::Output> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|e| crate::CharterError::io(path, e))?;
    Ok(parser.parse(&content))
}
