//! Tasks parser.
//!
//! A task is a `### <ID>: <Title>` heading where the id looks like `P1-001` or
//! `TASK-12`. Fields are read from labelled lines in the body, which may be
//! bulleted and bolded:
//!
//! ```text
//! ### P1-001: Set up workspace
//!
//! **Priority**: High
//! - **Estimate:** 2h
//! Phase: Foundation
//! Dependencies: P0-001, P0-002
//! Acceptance Criteria:
//!   - Workspace builds
//! ```

use super::section::{bullet_text, strip_checkbox, MarkdownLines};
use crate::error::{CharterError, Result};
use crate::models::{DerivedTask, Priority, Tasks, TasksMetadata};
use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use std::sync::LazyLock;

static TASK_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9]+-\d+):\s*(.+)$").expect("valid task heading regex"));

static TASK_ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z0-9]+-\d+\b").expect("valid task id regex"));

static LABELLED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*(?:[-*+]\s+)?(?:\*\*)?",
        r"(description|priority|estimate|phase|",
        r"acceptance criteria|dependencies|created|updated)",
        r"(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.*)$",
    ))
    .expect("valid labelled line regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Description,
    Priority,
    Estimate,
    Phase,
    AcceptanceCriteria,
    Dependencies,
    Created,
    Updated,
}

impl Label {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "description" => Some(Label::Description),
            "priority" => Some(Label::Priority),
            "estimate" => Some(Label::Estimate),
            "phase" => Some(Label::Phase),
            "acceptance criteria" => Some(Label::AcceptanceCriteria),
            "dependencies" => Some(Label::Dependencies),
            "created" => Some(Label::Created),
            "updated" => Some(Label::Updated),
            _ => None,
        }
    }
}

fn labelled(line: &str) -> Option<(Label, &str)> {
    let caps = LABELLED_LINE.captures(line)?;
    let label = Label::parse(caps.get(1)?.as_str())?;
    let value = caps.get(2).map_or("", |m| m.as_str());
    Some((label, value.trim().trim_end_matches("**").trim()))
}

/// Parse a tasks document.
///
/// When an id is defined twice the later definition wins and keeps the
/// position of the first; use [`parse_tasks_strict`] to reject duplicates.
pub fn parse_tasks(markdown: &str) -> Tasks {
    let _span = charter_telemetry::parse_span("tasks").entered();
    let (items, metadata) = scan(markdown);

    let mut by_id: IndexMap<String, DerivedTask> = IndexMap::with_capacity(items.len());
    for task in items {
        if let Some(previous) = by_id.insert(task.id.clone(), task) {
            tracing::warn!(task_id = %previous.id, "Duplicate task id, later definition wins");
        }
    }

    let tasks = Tasks {
        items: by_id.into_values().collect(),
        metadata,
    };
    tracing::debug!(count = tasks.len(), "Parsed tasks");
    tasks
}

/// Parse a tasks document, failing on the first repeated id.
pub fn parse_tasks_strict(markdown: &str) -> Result<Tasks> {
    let _span = charter_telemetry::parse_span("tasks").entered();
    let (items, metadata) = scan(markdown);

    let mut by_id: IndexMap<String, DerivedTask> = IndexMap::with_capacity(items.len());
    for task in items {
        match by_id.entry(task.id.clone()) {
            Entry::Occupied(entry) => return Err(CharterError::DuplicateTask(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(task);
            }
        }
    }

    Ok(Tasks {
        items: by_id.into_values().collect(),
        metadata,
    })
}

fn scan(markdown: &str) -> (Vec<DerivedTask>, Option<TasksMetadata>) {
    let doc = MarkdownLines::new(markdown);

    let task_headings: Vec<_> = doc
        .headings()
        .filter(|(_, h)| h.level == 3)
        .filter_map(|(index, h)| TASK_HEADING.captures(h.text).map(|caps| (index, caps)))
        .collect();

    let preamble_end = task_headings.first().map_or(doc.len(), |(index, _)| *index);
    let metadata = parse_metadata(&doc, preamble_end);

    let items = task_headings
        .into_iter()
        .map(|(index, caps)| {
            let body = doc.body_until(index, |_| true);
            let mut task = DerivedTask::new(&caps[1], caps[2].trim());
            fill_fields(&mut task, &doc, body);
            task
        })
        .collect();

    (items, metadata)
}

fn fill_fields(task: &mut DerivedTask, doc: &MarkdownLines<'_>, body: std::ops::Range<usize>) {
    let mut description: Option<String> = None;
    let mut paragraph: Vec<&str> = Vec::new();
    let mut paragraph_done = false;
    let mut in_criteria = false;

    for line in doc.slice(body) {
        if line.in_code {
            continue;
        }
        let text = line.text.trim();

        if let Some((label, value)) = labelled(line.text) {
            in_criteria = label == Label::AcceptanceCriteria;
            paragraph_done |= !paragraph.is_empty();
            match label {
                Label::Description => description = Some(value.to_string()),
                Label::Priority => task.priority = Priority::from_label(value),
                Label::Estimate => task.estimate = value.to_string(),
                Label::Phase => task.phase = (!value.is_empty()).then(|| value.to_string()),
                Label::AcceptanceCriteria => {
                    if !value.is_empty() {
                        task.acceptance_criteria.push(value.to_string());
                    }
                }
                Label::Dependencies => {
                    task.dependencies = Some(
                        TASK_ID_TOKEN
                            .find_iter(value)
                            .map(|m| m.as_str().to_string())
                            .collect(),
                    );
                }
                Label::Created | Label::Updated => {}
            }
            continue;
        }

        if let Some(item) = bullet_text(line.text) {
            paragraph_done |= !paragraph.is_empty();
            let item = strip_checkbox(item);
            if in_criteria && !item.is_empty() {
                task.acceptance_criteria.push(item.to_string());
            }
            continue;
        }

        if text.is_empty() {
            paragraph_done |= !paragraph.is_empty();
            continue;
        }

        in_criteria = false;
        if !paragraph_done {
            paragraph.push(text);
        }
    }

    task.description = description.unwrap_or_else(|| paragraph.join(" "));
}

fn parse_metadata(doc: &MarkdownLines<'_>, end: usize) -> Option<TasksMetadata> {
    let mut metadata = TasksMetadata::default();
    for line in doc.slice(0..end).iter().filter(|l| !l.in_code) {
        match labelled(line.text) {
            Some((Label::Created, value)) if metadata.created.is_none() => {
                metadata.created = Some(value.to_string());
            }
            Some((Label::Updated, value)) if metadata.updated.is_none() => {
                metadata.updated = Some(value.to_string());
            }
            _ => {}
        }
    }
    (metadata != TasksMetadata::default()).then_some(metadata)
}
