//! Span helpers for charter operations
//!
//! Provides pre-configured spans for instrumenting parsing, validation and
//! commit-history synchronisation.

use tracing::Span;

/// Create a span for parsing a markdown document
///
/// # Arguments
/// * `document_kind` - Kind of document ("constitution", "spec", "tasks", "progress")
///
/// # Example
/// ```
/// use charter_telemetry::parse_span;
/// let span = parse_span("constitution");
/// let _enter = span.enter();
/// ```
pub fn parse_span(document_kind: &str) -> Span {
    tracing::debug_span!("charter.parse", document.kind = document_kind)
}

/// Create a span for validating a specification against a constitution
///
/// # Arguments
/// * `rule_count` - Total number of constitution rules being evaluated
pub fn validation_span(rule_count: usize) -> Span {
    tracing::info_span!(
        "charter.validate",
        rules.total = rule_count,
        otel.kind = "internal"
    )
}

/// Create a span for a single commit-history synchronisation pass
///
/// # Arguments
/// * `repo_path` - Repository the commit log is read from
/// * `since` - Lower bound passed to the log query, if any
pub fn git_sync_span(repo_path: &str, since: Option<&str>) -> Span {
    tracing::info_span!(
        "charter.git_sync",
        repo.path = repo_path,
        since = since.unwrap_or("-"),
        otel.kind = "client"
    )
}

/// Create a span for one watcher poll
///
/// # Arguments
/// * `poll` - Sequence number of the poll, starting at 1
pub fn watch_poll_span(poll: u64) -> Span {
    tracing::debug_span!("charter.watch_poll", poll = poll)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let _parse = parse_span("tasks");
        let _validate = validation_span(4);
        let _sync = git_sync_span(".", Some("2024-01-01T00:00:00Z"));
        let _poll = watch_poll_span(1);
    }
}
