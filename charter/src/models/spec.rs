//! Specification content extracted from markdown.

use serde::{Deserialize, Serialize};

/// A single objective bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub description: String,
}

impl Objective {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Kind of requirement, taken from the section it was listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
}

impl std::fmt::Display for RequirementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementType::Functional => write!(f, "functional"),
            RequirementType::NonFunctional => write!(f, "non-functional"),
        }
    }
}

/// A single requirement bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub requirement_type: Option<RequirementType>,
}

impl Requirement {
    /// Create an untyped requirement.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            requirement_type: None,
        }
    }

    /// Create a functional requirement.
    pub fn functional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            requirement_type: Some(RequirementType::Functional),
        }
    }
}

/// A parsed specification document.
///
/// `raw_markdown` always holds the verbatim input so rule checks can look for
/// phrases the structured fields do not capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub raw_markdown: String,
}

impl SpecContent {
    /// Spec with only raw text and no structured fields.
    pub fn from_raw(raw_markdown: impl Into<String>) -> Self {
        Self {
            raw_markdown: raw_markdown.into(),
            ..Default::default()
        }
    }

    /// Whether the spec carries a non-empty overview.
    pub fn has_overview(&self) -> bool {
        self.overview.as_deref().is_some_and(|o| !o.trim().is_empty())
    }
}
