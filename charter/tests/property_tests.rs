//! Property-based tests for parsing, scoring and progress reporting.
//!
//! These tests check the properties that hold for any input shape: rule
//! counts survive interleaved prose, scores stay in range, and progress
//! reports re-parse into the same completed set.

use charter::{
    parse_constitution, parse_spec, DerivedTask, IssueSeverity, ProgressTracker, RuleCategory,
    SpecValidator, TaskProgressUpdate, Tasks,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ============================================================================
// Generators
// ============================================================================

/// Generate a rule title (starts with a letter, no trailing space)
fn arb_title() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [a-z]{2,8}){0,3}"
}

/// Generate a prose line that never looks like a heading
fn arb_prose() -> impl Strategy<Value = String> {
    "[a-z][a-z ,.]{0,60}"
}

/// Generate spec fragments that trip some built-in checks and not others
fn arb_spec_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("## Overview\n\nA service.".to_string()),
        Just("## Acceptance Criteria\n\n- It works".to_string()),
        Just("## Objectives\n\n- a\n- b\n- c\n- d".to_string()),
        Just("Payloads use the any type.".to_string()),
        Just("const x = require('x');".to_string()),
        Just("Flow: domain -> gateway".to_string()),
        Just("This module handles everything.".to_string()),
        arb_prose(),
    ]
}

const CONSTITUTION: &str = r#"# Constitution

### 1. Overview Required

Specs open with an overview.

### 2. Acceptance Criteria

Specs are testable.

### C1: No Any

Code must not use the any type.

### C2: ES Modules

Code should not call require().

### AR1: Layering

No domain to gateway dependencies.

### DP1: Single Responsibility

Keep modules focused.
"#;

fn tasks(count: usize) -> Tasks {
    Tasks::new(
        (1..=count)
            .map(|i| DerivedTask::new(format!("T-{:03}", i), format!("Task number {}", i)))
            .collect(),
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rule counts equal the number of well-formed headings, whatever prose
    /// sits between them.
    #[test]
    fn prop_rule_counts_survive_interleaving(
        principles in prop::collection::vec((arb_title(), arb_prose()), 0..6),
        constraints in prop::collection::vec((arb_title(), arb_prose()), 0..6),
        preamble in arb_prose(),
    ) {
        let mut markdown = format!("# Constitution\n\n{}\n\n## Principles\n\n", preamble);
        for (i, (title, body)) in principles.iter().enumerate() {
            markdown.push_str(&format!("### {}. {}\n\n{}\n\n", i + 1, title, body));
        }
        markdown.push_str("## Constraints\n\n");
        for (i, (title, body)) in constraints.iter().enumerate() {
            markdown.push_str(&format!("### C{}: {}\n\n{}\n\n", i + 1, title, body));
        }

        let constitution = parse_constitution(&markdown);
        prop_assert_eq!(constitution.rules(RuleCategory::Principle).len(), principles.len());
        prop_assert_eq!(constitution.rules(RuleCategory::Constraint).len(), constraints.len());
        prop_assert_eq!(constitution.total_rules(), principles.len() + constraints.len());

        for (rule, (title, _)) in constitution.constraints.iter().zip(&constraints) {
            prop_assert_eq!(&rule.title, title);
        }

        // Parsing is pure
        prop_assert_eq!(parse_constitution(&markdown), constitution);
    }

    /// Scores stay within 0..=100 and validity tracks error issues exactly.
    #[test]
    fn prop_score_bounds_and_validity(
        fragments in prop::collection::vec(arb_spec_fragment(), 0..8),
    ) {
        let spec = parse_spec(&format!("# Generated\n\n{}\n", fragments.join("\n\n")));
        let result = SpecValidator::new(parse_constitution(CONSTITUTION)).validate(&spec);

        prop_assert!(result.score <= 100);
        prop_assert!(result.passed_constraints <= result.checked_constraints);
        prop_assert_eq!(result.checked_constraints, 6);

        let has_errors = result.issues.iter().any(|i| i.severity == IssueSeverity::Error);
        prop_assert_eq!(result.valid, !has_errors);
        if result.issues.is_empty() {
            prop_assert_eq!(result.score, 100);
        }
    }

    /// The progress report re-parses into the same completed set.
    #[test]
    fn prop_progress_round_trip(
        count in 1usize..15,
        picks in prop::collection::vec(any::<bool>(), 15),
    ) {
        let tasks = tasks(count);
        let mut tracker = ProgressTracker::new(&tasks);
        let completed: BTreeSet<String> = tasks
            .ids()
            .zip(&picks)
            .filter(|(_, picked)| **picked)
            .map(|(id, _)| id.to_string())
            .collect();
        for id in &completed {
            tracker.update_progress(TaskProgressUpdate::completed(id.clone())).unwrap();
        }

        let stats = tracker.calculate_completion();
        prop_assert_eq!(stats.completed, completed.len());
        prop_assert!(stats.percent_complete <= 100);
        prop_assert_eq!(stats.completed + stats.remaining, count);

        let mut reloaded = ProgressTracker::new(&tasks);
        let loaded = reloaded.load_progress(&tracker.generate_progress_markdown());
        prop_assert_eq!(loaded, completed.len());

        let reparsed: BTreeSet<String> = reloaded
            .statuses()
            .filter(|s| s.completed())
            .map(|s| s.id().to_string())
            .collect();
        prop_assert_eq!(reparsed, completed);
    }
}
