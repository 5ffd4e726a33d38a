//! Validation issues, results and reports.

use super::constitution::RuleCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
///
/// Declaration order is the order issues are grouped in rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

impl IssueSeverity {
    pub const ALL: [IssueSeverity; 3] = [
        IssueSeverity::Error,
        IssueSeverity::Warning,
        IssueSeverity::Info,
    ];

    /// Plural heading used when grouping issues.
    pub fn heading(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "Errors",
            IssueSeverity::Warning => "Warnings",
            IssueSeverity::Info => "Info",
        }
    }
}

impl std::fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueSeverity::Error => write!(f, "error"),
            IssueSeverity::Warning => write!(f, "warning"),
            IssueSeverity::Info => write!(f, "info"),
        }
    }
}

/// The rule an issue was raised against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueConstraint {
    pub id: String,
    #[serde(rename = "type")]
    pub category: RuleCategory,
    pub description: String,
}

/// A single finding produced by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// `<RULE-ID>-VIOLATION`
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<IssueConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Category of the rule that raised this issue, when tagged.
    pub fn category(&self) -> Option<RuleCategory> {
        self.constraint.as_ref().map(|c| c.category)
    }
}

/// Aggregate outcome of validating one spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff no issue has severity error
    pub valid: bool,
    /// 0..=100
    pub score: u32,
    pub issues: Vec<ValidationIssue>,
    pub checked_constraints: usize,
    pub passed_constraints: usize,
}

impl ValidationResult {
    /// Build a result, deriving `valid` and `score` from the inputs.
    pub fn new(issues: Vec<ValidationIssue>, checked: usize, passed: usize) -> Self {
        let valid = !issues.iter().any(|i| i.severity == IssueSeverity::Error);
        Self {
            valid,
            score: compute_score(passed, checked),
            issues,
            checked_constraints: checked,
            passed_constraints: passed,
        }
    }

    /// Number of issues with the given severity.
    pub fn count(&self, severity: IssueSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(IssueSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(IssueSeverity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(IssueSeverity::Info)
    }
}

/// Percentage of passed rules, rounded; a vacuous check scores 100.
pub fn compute_score(passed: usize, checked: usize) -> u32 {
    if checked == 0 {
        return 100;
    }
    let passed = passed.min(checked);
    ((passed as f64 / checked as f64) * 100.0).round() as u32
}

/// Checked/passed counts for one rule category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub checked: usize,
    pub passed: usize,
}

/// Per-category breakdown of a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdowns {
    pub principles: CategoryBreakdown,
    pub constraints: CategoryBreakdown,
    pub architecture_rules: CategoryBreakdown,
    pub design_principles: CategoryBreakdown,
}

impl CategoryBreakdowns {
    pub fn get(&self, category: RuleCategory) -> CategoryBreakdown {
        match category {
            RuleCategory::Principle => self.principles,
            RuleCategory::Constraint => self.constraints,
            RuleCategory::Architecture => self.architecture_rules,
            RuleCategory::DesignPrinciple => self.design_principles,
        }
    }

    pub fn get_mut(&mut self, category: RuleCategory) -> &mut CategoryBreakdown {
        match category {
            RuleCategory::Principle => &mut self.principles,
            RuleCategory::Constraint => &mut self.constraints,
            RuleCategory::Architecture => &mut self.architecture_rules,
            RuleCategory::DesignPrinciple => &mut self.design_principles,
        }
    }
}

/// A validation result enriched with a timestamp, per-category breakdown and
/// recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(flatten)]
    pub result: ValidationResult,
    pub timestamp: DateTime<Utc>,
    pub categories: CategoryBreakdowns,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: IssueSeverity) -> ValidationIssue {
        ValidationIssue {
            severity,
            code: "X-VIOLATION".to_string(),
            message: "m".to_string(),
            constraint: None,
            suggestion: None,
        }
    }

    #[test]
    fn test_score_rounding() {
        assert_eq!(compute_score(0, 0), 100);
        assert_eq!(compute_score(2, 3), 67);
        assert_eq!(compute_score(1, 3), 33);
        assert_eq!(compute_score(1, 8), 13);
        assert_eq!(compute_score(5, 5), 100);
        assert_eq!(compute_score(0, 4), 0);
    }

    #[test]
    fn test_validity_follows_errors() {
        let result = ValidationResult::new(vec![issue(IssueSeverity::Warning)], 2, 1);
        assert!(result.valid);
        assert_eq!(result.score, 50);

        let result = ValidationResult::new(
            vec![issue(IssueSeverity::Info), issue(IssueSeverity::Error)],
            2,
            0,
        );
        assert!(!result.valid);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.info_count(), 1);
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_severity_order() {
        let mut severities = vec![
            IssueSeverity::Info,
            IssueSeverity::Error,
            IssueSeverity::Warning,
        ];
        severities.sort();
        assert_eq!(severities, IssueSeverity::ALL.to_vec());
    }
}
