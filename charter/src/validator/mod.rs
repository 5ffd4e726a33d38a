//! Specification validation against a constitution.
//!
//! [`SpecValidator`] evaluates every rule of every category through a
//! [`RuleRegistry`] and aggregates the findings into a [`ValidationResult`]
//! or a richer [`ValidationReport`].
//!
//! # Example
//!
//! ```rust
//! use charter::parsers::{parse_constitution, parse_spec};
//! use charter::validator::SpecValidator;
//!
//! let constitution = parse_constitution("### C1: No Any\n\nCode must avoid it.\n");
//! let spec = parse_spec("# Feature\n\nFields use the any type.\n");
//!
//! let result = SpecValidator::new(constitution).validate(&spec);
//! assert!(!result.valid);
//! assert_eq!(result.issues[0].code, "C1-VIOLATION");
//! ```

pub mod report;
pub mod rules;

pub use report::format_report_as_markdown;
pub use rules::{RegisteredCheck, RuleCheck, RuleRegistry, RuleViolation};

use crate::models::{
    CategoryBreakdowns, Constitution, ConstraintSeverity, IssueConstraint, IssueSeverity,
    RuleCategory, RuleItem, SpecContent, ValidationIssue, ValidationReport, ValidationResult,
};
use chrono::Utc;

/// Validates specifications against one constitution.
#[derive(Debug, Clone)]
pub struct SpecValidator {
    constitution: Constitution,
    registry: RuleRegistry,
}

impl SpecValidator {
    /// Validator using the built-in rule checks.
    pub fn new(constitution: Constitution) -> Self {
        Self::with_registry(constitution, RuleRegistry::with_builtin_rules())
    }

    /// Validator using a caller-supplied registry.
    pub fn with_registry(constitution: Constitution, registry: RuleRegistry) -> Self {
        Self {
            constitution,
            registry,
        }
    }

    pub fn constitution(&self) -> &Constitution {
        &self.constitution
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// Evaluate every rule against `spec`.
    pub fn validate(&self, spec: &SpecContent) -> ValidationResult {
        let _span = charter_telemetry::validation_span(self.constitution.total_rules()).entered();

        let mut issues = Vec::new();
        let mut checked = 0;
        let mut passed = 0;

        for (category, rule) in self.constitution.iter_rules() {
            checked += 1;
            match self.evaluate(category, rule, spec) {
                Some(issue) => {
                    tracing::debug!(
                        code = %issue.code,
                        severity = %issue.severity,
                        "Rule violated"
                    );
                    issues.push(issue);
                }
                None => passed += 1,
            }
        }

        let result = ValidationResult::new(issues, checked, passed);
        tracing::info!(
            valid = result.valid,
            score = result.score,
            checked = result.checked_constraints,
            passed = result.passed_constraints,
            "Validation complete"
        );
        result
    }

    /// Validate and add a timestamp, per-category breakdown and recommendations.
    pub fn generate_report(&self, spec: &SpecContent) -> ValidationReport {
        let result = self.validate(spec);

        let mut categories = CategoryBreakdowns::default();
        for category in RuleCategory::ALL {
            let checked = self.constitution.rules(category).len();
            let failed = result
                .issues
                .iter()
                .filter(|issue| issue.category() == Some(category))
                .count();
            let breakdown = categories.get_mut(category);
            breakdown.checked = checked;
            breakdown.passed = checked.saturating_sub(failed);
        }

        let recommendations = recommendations(&result);
        ValidationReport {
            result,
            timestamp: Utc::now(),
            categories,
            recommendations,
        }
    }

    fn evaluate(
        &self,
        category: RuleCategory,
        rule: &RuleItem,
        spec: &SpecContent,
    ) -> Option<ValidationIssue> {
        let registered = self.registry.get(category, &rule.id)?;
        let violation = registered.check.check(rule, spec)?;

        let severity = match category {
            RuleCategory::Constraint if rule.severity == Some(ConstraintSeverity::Must) => {
                IssueSeverity::Error
            }
            RuleCategory::Constraint => IssueSeverity::Warning,
            _ => registered.severity,
        };

        Some(ValidationIssue {
            severity,
            code: format!("{}-VIOLATION", rule.id),
            message: violation.message,
            constraint: Some(IssueConstraint {
                id: rule.id.clone(),
                category,
                description: rule.title.clone(),
            }),
            suggestion: violation.suggestion,
        })
    }
}

fn recommendations(result: &ValidationResult) -> Vec<String> {
    let mut lines = Vec::new();

    let errors = result.error_count();
    if errors > 0 {
        lines.push(format!(
            "Resolve {} error(s) before implementation; they violate mandatory constraints.",
            errors
        ));
    }

    let warnings = result.warning_count();
    if warnings > 0 {
        lines.push(format!(
            "Review {} warning(s) to bring the specification in line with the constitution.",
            warnings
        ));
    }

    match result.score {
        0..70 => lines.push(format!(
            "Score {}/100: thorough review needed before implementation.",
            result.score
        )),
        70..85 => lines.push(format!(
            "Score {}/100: good but improvable.",
            result.score
        )),
        _ => {}
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Objective;

    fn constitution() -> Constitution {
        Constitution {
            principles: vec![RuleItem::new("1", "Overview First", "")],
            constraints: vec![
                RuleItem::new("C1", "No Any", "").with_severity(ConstraintSeverity::Must),
                RuleItem::new("C2", "No require", "").with_severity(ConstraintSeverity::Should),
            ],
            architecture_rules: vec![RuleItem::new("AR7", "Unchecked", "")],
            design_principles: vec![],
            metadata: None,
        }
    }

    #[test]
    fn test_must_constraint_is_error() {
        let spec = SpecContent::from_raw("uses the any type\nrequire('x')");
        let result = SpecValidator::new(constitution()).validate(&spec);

        let codes: Vec<_> = result
            .issues
            .iter()
            .map(|i| (i.code.as_str(), i.severity))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("1-VIOLATION", IssueSeverity::Warning),
                ("C1-VIOLATION", IssueSeverity::Error),
                ("C2-VIOLATION", IssueSeverity::Warning),
            ]
        );
        assert!(!result.valid);
        assert_eq!(result.checked_constraints, 4);
        assert_eq!(result.passed_constraints, 1);
        assert_eq!(result.score, 25);
    }

    #[test]
    fn test_unregistered_rule_passes() {
        let mut spec = SpecContent::from_raw("clean");
        spec.overview = Some("An overview".to_string());
        let result = SpecValidator::new(constitution()).validate(&spec);
        assert!(result.valid);
        assert!(result.issues.is_empty());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_issue_is_tagged_with_rule() {
        let spec = SpecContent::from_raw("any type");
        let result = SpecValidator::new(constitution()).validate(&spec);
        let issue = result.issues.iter().find(|i| i.code == "C1-VIOLATION").unwrap();
        let tag = issue.constraint.as_ref().unwrap();
        assert_eq!(tag.id, "C1");
        assert_eq!(tag.category, RuleCategory::Constraint);
        assert_eq!(tag.description, "No Any");
        assert!(issue.suggestion.is_some());
    }

    #[test]
    fn test_report_breakdown_and_recommendations() {
        let mut spec = SpecContent::from_raw("any type");
        spec.objectives = vec![Objective::new("one")];
        let report = SpecValidator::new(constitution()).generate_report(&spec);

        assert_eq!(report.categories.principles.checked, 1);
        assert_eq!(report.categories.principles.passed, 0);
        assert_eq!(report.categories.constraints.checked, 2);
        assert_eq!(report.categories.constraints.passed, 1);
        assert_eq!(report.categories.architecture_rules.passed, 1);
        assert_eq!(report.categories.design_principles.checked, 0);

        // 2 of 4 rules pass: score 50
        assert_eq!(report.result.score, 50);
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].starts_with("Resolve 1 error(s)"));
        assert!(report.recommendations[1].starts_with("Review 1 warning(s)"));
        assert!(report.recommendations[2].contains("thorough review needed"));
    }

    #[test]
    fn test_score_bands() {
        let good = ValidationResult::new(vec![], 5, 4);
        assert_eq!(recommendations(&good), vec!["Score 80/100: good but improvable."]);

        let great = ValidationResult::new(vec![], 20, 17);
        assert!(recommendations(&great).is_empty());
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = RuleRegistry::empty();
        registry.register(
            RuleCategory::Architecture,
            "AR7",
            IssueSeverity::Info,
            |_: &RuleItem, _: &SpecContent| Some(RuleViolation::new("always")),
        );
        let validator = SpecValidator::with_registry(constitution(), registry);
        let result = validator.validate(&SpecContent::from_raw("any type"));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, "AR7-VIOLATION");
        assert_eq!(result.issues[0].severity, IssueSeverity::Info);
        assert!(result.valid);
    }
}
