//! Constitution parser.
//!
//! Rules are level-3 headings in one of four shapes:
//!
//! ```text
//! ### 1. Principle title
//! ### C1: Constraint title
//! ### AR1: Architecture rule title
//! ### DP1: Design principle title
//! ```
//!
//! A rule's description runs to the next level 2 or 3 heading, so bodies may
//! contain level 4+ sub-headings. Parsing never fails.

use super::section::{is_level_2_or_3, MarkdownLines};
use crate::models::{
    Constitution, ConstitutionMetadata, ConstraintSeverity, RuleCategory, RuleItem,
};
use regex::Regex;
use std::sync::LazyLock;

/// Heading shape and id prefix for one rule category.
struct CategoryPattern {
    category: RuleCategory,
    heading: Regex,
    id_prefix: &'static str,
}

static CATEGORY_PATTERNS: LazyLock<Vec<CategoryPattern>> = LazyLock::new(|| {
    [
        (RuleCategory::Principle, r"^(\d+)\.\s+(.+)$", ""),
        (RuleCategory::Constraint, r"^C(\d+):\s*(.+)$", "C"),
        (RuleCategory::Architecture, r"^AR(\d+):\s*(.+)$", "AR"),
        (RuleCategory::DesignPrinciple, r"^DP(\d+):\s*(.+)$", "DP"),
    ]
    .into_iter()
    .map(|(category, pattern, id_prefix)| CategoryPattern {
        category,
        heading: Regex::new(pattern).expect("valid rule heading regex"),
        id_prefix,
    })
    .collect()
});

static VERSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bv\d+(?:\.\d+)*").expect("valid version regex"));

static SEVERITY_WORDS: LazyLock<[(ConstraintSeverity, Regex); 3]> = LazyLock::new(|| {
    [
        (ConstraintSeverity::Must, Regex::new(r"(?i)\bmust\b").expect("valid regex")),
        (ConstraintSeverity::Should, Regex::new(r"(?i)\bshould\b").expect("valid regex")),
        (ConstraintSeverity::May, Regex::new(r"(?i)\bmay\b").expect("valid regex")),
    ]
});

/// Parse a constitution document.
pub fn parse_constitution(content: &str) -> Constitution {
    let _span = charter_telemetry::parse_span("constitution").entered();
    let doc = MarkdownLines::new(content);

    let mut constitution = Constitution {
        metadata: parse_metadata(&doc),
        ..Default::default()
    };

    for pattern in CATEGORY_PATTERNS.iter() {
        *constitution.rules_mut(pattern.category) = scan_category(&doc, pattern);
    }

    tracing::debug!(
        principles = constitution.principles.len(),
        constraints = constitution.constraints.len(),
        architecture_rules = constitution.architecture_rules.len(),
        design_principles = constitution.design_principles.len(),
        "Parsed constitution"
    );

    constitution
}

fn scan_category(doc: &MarkdownLines<'_>, pattern: &CategoryPattern) -> Vec<RuleItem> {
    doc.headings()
        .filter(|(_, heading)| heading.level == 3)
        .filter_map(|(index, heading)| {
            let caps = pattern.heading.captures(heading.text)?;
            let id = format!("{}{}", pattern.id_prefix, &caps[1]);
            let title = caps[2].trim().to_string();
            let description = doc.text(doc.body_until(index, is_level_2_or_3));

            let mut item = RuleItem::new(id, title, description);
            if pattern.category == RuleCategory::Constraint {
                item.severity = constraint_severity(&item.description);
            }
            Some(item)
        })
        .collect()
}

/// Strongest of must/should/may mentioned in a constraint body.
pub fn constraint_severity(body: &str) -> Option<ConstraintSeverity> {
    SEVERITY_WORDS
        .iter()
        .find(|(_, word)| word.is_match(body))
        .map(|(severity, _)| *severity)
}

fn parse_metadata(doc: &MarkdownLines<'_>) -> Option<ConstitutionMetadata> {
    let title = doc.first_heading(1).map(str::to_string);

    let applies_to = doc
        .iter()
        .find(|line| !line.in_code && line.text.starts_with('>'))
        .map(|line| line.text.trim_start_matches('>').trim())
        .filter(|text| VERSION_TOKEN.is_match(text))
        .map(str::to_string);

    if title.is_none() && applies_to.is_none() {
        return None;
    }
    Some(ConstitutionMetadata { title, applies_to })
}
