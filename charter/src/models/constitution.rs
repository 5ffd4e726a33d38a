//! Constitution data structures.
//!
//! A constitution is a markdown document declaring the rules a specification
//! is governed by, grouped into four fixed categories.

use serde::{Deserialize, Serialize};

/// The four rule categories a constitution can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    /// `### <N>. <Title>`
    Principle,
    /// `### C<N>: <Title>`
    Constraint,
    /// `### AR<N>: <Title>`
    Architecture,
    /// `### DP<N>: <Title>`
    DesignPrinciple,
}

impl RuleCategory {
    /// All categories in evaluation and rendering order.
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::Principle,
        RuleCategory::Constraint,
        RuleCategory::Architecture,
        RuleCategory::DesignPrinciple,
    ];

    /// Machine name used in issue tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Principle => "principle",
            RuleCategory::Constraint => "constraint",
            RuleCategory::Architecture => "architecture",
            RuleCategory::DesignPrinciple => "design-principle",
        }
    }

    /// Human-readable plural label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            RuleCategory::Principle => "Principles",
            RuleCategory::Constraint => "Constraints",
            RuleCategory::Architecture => "Architecture Rules",
            RuleCategory::DesignPrinciple => "Design Principles",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength of a constraint, derived from the wording of its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintSeverity {
    Must,
    Should,
    May,
}

impl std::fmt::Display for ConstraintSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintSeverity::Must => write!(f, "must"),
            ConstraintSeverity::Should => write!(f, "should"),
            ConstraintSeverity::May => write!(f, "may"),
        }
    }
}

/// A single rule in one constitution category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleItem {
    /// Category-scoped identifier ("1", "C1", "AR2", "DP3")
    pub id: String,
    /// Heading text after the identifier
    pub title: String,
    /// Raw section body up to the next level 2 or 3 heading
    pub description: String,
    /// Only ever set on constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<ConstraintSeverity>,
}

impl RuleItem {
    /// Create a new rule item without severity.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            severity: None,
        }
    }

    /// Set the constraint severity.
    pub fn with_severity(mut self, severity: ConstraintSeverity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Document-level information about a constitution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstitutionMetadata {
    /// Text of the first H1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// First top-level blockquote line, kept only when it carries a version token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
}

/// A parsed constitution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constitution {
    #[serde(default)]
    pub principles: Vec<RuleItem>,
    #[serde(default)]
    pub constraints: Vec<RuleItem>,
    #[serde(default)]
    pub architecture_rules: Vec<RuleItem>,
    #[serde(default)]
    pub design_principles: Vec<RuleItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConstitutionMetadata>,
}

impl Constitution {
    /// Rules of one category, in document order.
    pub fn rules(&self, category: RuleCategory) -> &[RuleItem] {
        match category {
            RuleCategory::Principle => &self.principles,
            RuleCategory::Constraint => &self.constraints,
            RuleCategory::Architecture => &self.architecture_rules,
            RuleCategory::DesignPrinciple => &self.design_principles,
        }
    }

    /// Mutable access to the rules of one category.
    pub fn rules_mut(&mut self, category: RuleCategory) -> &mut Vec<RuleItem> {
        match category {
            RuleCategory::Principle => &mut self.principles,
            RuleCategory::Constraint => &mut self.constraints,
            RuleCategory::Architecture => &mut self.architecture_rules,
            RuleCategory::DesignPrinciple => &mut self.design_principles,
        }
    }

    /// Every rule paired with its category, categories in [`RuleCategory::ALL`] order.
    pub fn iter_rules(&self) -> impl Iterator<Item = (RuleCategory, &RuleItem)> {
        RuleCategory::ALL
            .into_iter()
            .flat_map(move |category| self.rules(category).iter().map(move |r| (category, r)))
    }

    /// Total number of rules across all categories.
    pub fn total_rules(&self) -> usize {
        RuleCategory::ALL
            .iter()
            .map(|c| self.rules(*c).len())
            .sum()
    }

    /// Whether the constitution declares no rules at all.
    pub fn is_empty(&self) -> bool {
        self.total_rules() == 0
    }
}
