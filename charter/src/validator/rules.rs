//! Rule registry and built-in rule checks.
//!
//! A check is looked up by `(category, rule id)`. Rules without a registered
//! check always pass, so a constitution can declare rules that are reviewed
//! by humans only.

use crate::models::{IssueSeverity, RuleCategory, RuleItem, SpecContent};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// What a failing check reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub message: String,
    pub suggestion: Option<String>,
}

impl RuleViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// A predicate evaluating one constitution rule against a spec.
pub trait RuleCheck: Send + Sync {
    /// `None` when the spec satisfies the rule.
    fn check(&self, rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation>;
}

impl<F> RuleCheck for F
where
    F: Fn(&RuleItem, &SpecContent) -> Option<RuleViolation> + Send + Sync,
{
    fn check(&self, rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
        self(rule, spec)
    }
}

/// A check together with the severity of the issues it raises.
///
/// Constraint issues ignore `severity`: they are errors for `must`
/// constraints and warnings otherwise.
#[derive(Clone)]
pub struct RegisteredCheck {
    pub severity: IssueSeverity,
    pub check: Arc<dyn RuleCheck>,
}

impl std::fmt::Debug for RegisteredCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredCheck")
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Maps `(category, rule id)` to a check.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    checks: HashMap<(RuleCategory, String), RegisteredCheck>,
}

impl RuleRegistry {
    /// An empty registry: every rule passes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in checks.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::empty();
        registry.register(RuleCategory::Principle, "1", IssueSeverity::Warning, requires_overview);
        registry.register(
            RuleCategory::Principle,
            "2",
            IssueSeverity::Info,
            requires_acceptance_criteria,
        );
        registry.register(RuleCategory::Constraint, "C1", IssueSeverity::Warning, no_any_type);
        registry.register(RuleCategory::Constraint, "C2", IssueSeverity::Warning, no_require_calls);
        registry.register(
            RuleCategory::Architecture,
            "AR1",
            IssueSeverity::Warning,
            no_domain_to_gateway,
        );
        registry.register(
            RuleCategory::DesignPrinciple,
            "DP1",
            IssueSeverity::Info,
            single_responsibility,
        );
        registry
    }

    /// Register (or replace) the check for a rule.
    pub fn register(
        &mut self,
        category: RuleCategory,
        rule_id: impl Into<String>,
        severity: IssueSeverity,
        check: impl RuleCheck + 'static,
    ) -> &mut Self {
        self.checks.insert(
            (category, rule_id.into()),
            RegisteredCheck {
                severity,
                check: Arc::new(check),
            },
        );
        self
    }

    /// Remove the check for a rule, making it pass unconditionally.
    pub fn unregister(&mut self, category: RuleCategory, rule_id: &str) -> bool {
        self.checks.remove(&(category, rule_id.to_string())).is_some()
    }

    pub fn get(&self, category: RuleCategory, rule_id: &str) -> Option<&RegisteredCheck> {
        self.checks.get(&(category, rule_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

static REQUIRE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brequire\s*\(").expect("valid require regex"));

static DOMAIN_TO_GATEWAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdomain\b.*(?:→|->).*\bgateways?\b").expect("valid layering regex")
});

const MULTI_RESPONSIBILITY_PHRASES: &[&str] = &[
    "multiple responsibilities",
    "handles everything",
    "and also",
    "as well as",
];

/// Objectives beyond which multi-responsibility language is flagged.
const MAX_FOCUSED_OBJECTIVES: usize = 3;

fn requires_overview(_rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    if spec.has_overview() {
        return None;
    }
    Some(
        RuleViolation::new("Specification has no Overview section")
            .with_suggestion("Add an \"## Overview\" section describing the feature"),
    )
}

fn requires_acceptance_criteria(_rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    if !spec.acceptance_criteria.is_empty() {
        return None;
    }
    Some(
        RuleViolation::new("Specification lists no acceptance criteria")
            .with_suggestion("Add an \"## Acceptance Criteria\" section with testable bullets"),
    )
}

fn no_any_type(rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    if !spec.raw_markdown.to_lowercase().contains("any type") {
        return None;
    }
    Some(
        RuleViolation::new(format!("Specification mentions the 'any' type ({})", rule.title))
            .with_suggestion("Use a concrete type or a generic instead of 'any'"),
    )
}

fn no_require_calls(rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    let offending = spec
        .raw_markdown
        .lines()
        .filter(|line| REQUIRE_CALL.is_match(line) && !line.contains("// legacy"))
        .count();
    if offending == 0 {
        return None;
    }
    Some(
        RuleViolation::new(format!(
            "Found {} require() call(s) not marked // legacy ({})",
            offending, rule.title
        ))
        .with_suggestion("Use import statements, or mark existing calls with // legacy"),
    )
}

fn no_domain_to_gateway(rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    let line = spec
        .raw_markdown
        .lines()
        .find(|line| DOMAIN_TO_GATEWAY.is_match(line))?;
    Some(
        RuleViolation::new(format!(
            "Invalid dependency direction '{}' ({})",
            line.trim(),
            rule.title
        ))
        .with_suggestion("Domain code must not depend on gateways; invert the dependency"),
    )
}

fn single_responsibility(rule: &RuleItem, spec: &SpecContent) -> Option<RuleViolation> {
    let raw = spec.raw_markdown.to_lowercase();
    let phrase = MULTI_RESPONSIBILITY_PHRASES
        .iter()
        .find(|phrase| raw.contains(*phrase))?;
    if spec.objectives.len() <= MAX_FOCUSED_OBJECTIVES {
        return None;
    }
    Some(
        RuleViolation::new(format!(
            "Spec has {} objectives and uses multi-responsibility language (\"{}\") ({})",
            spec.objectives.len(),
            phrase,
            rule.title
        ))
        .with_suggestion("Split the specification into focused specs"),
    )
}
