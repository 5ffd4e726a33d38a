//! Task collection data structures.
//!
//! Tasks are derived from a markdown plan: each `### <ID>: <Title>` heading
//! becomes one [`DerivedTask`] with priority, estimate, phase, acceptance
//! criteria and dependencies read from labelled lines beneath it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Normalize free-form priority text, falling back to medium.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.contains("high") || lower.contains("critical") || lower.starts_with("p0") {
            Priority::High
        } else if lower.contains("low") {
            Priority::Low
        } else {
            Priority::Medium
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// A single task derived from the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTask {
    /// Identifier such as "P1-001" or "TASK-12"
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// Free-form estimate ("2h", "3 days"); empty when absent
    #[serde(default)]
    pub estimate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// `None` when the task has no Dependencies line at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

impl DerivedTask {
    /// Create a task with default priority and no optional fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            estimate: String::new(),
            phase: None,
            acceptance_criteria: Vec::new(),
            dependencies: None,
        }
    }
}

/// Collection-level timestamps, kept as written in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// A parsed task collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tasks {
    #[serde(default)]
    pub items: Vec<DerivedTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TasksMetadata>,
}

impl Tasks {
    /// Create a collection from tasks, without metadata.
    pub fn new(items: Vec<DerivedTask>) -> Self {
        Self {
            items,
            metadata: None,
        }
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&DerivedTask> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Task ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids that appear more than once, each reported once in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for task in &self.items {
            if !seen.insert(task.id.as_str()) && reported.insert(task.id.as_str()) {
                duplicates.push(task.id.clone());
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_label() {
        assert_eq!(Priority::from_label("High"), Priority::High);
        assert_eq!(Priority::from_label("  CRITICAL "), Priority::High);
        assert_eq!(Priority::from_label("low"), Priority::Low);
        assert_eq!(Priority::from_label("normal"), Priority::Medium);
        assert_eq!(Priority::from_label(""), Priority::Medium);
    }

    #[test]
    fn test_duplicate_ids() {
        let tasks = Tasks::new(vec![
            DerivedTask::new("P1-001", "a"),
            DerivedTask::new("P1-002", "b"),
            DerivedTask::new("P1-001", "c"),
            DerivedTask::new("P1-001", "d"),
        ]);
        assert_eq!(tasks.duplicate_ids(), vec!["P1-001".to_string()]);
        assert_eq!(tasks.get("P1-002").map(|t| t.title.as_str()), Some("b"));
    }
}
