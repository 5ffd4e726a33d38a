//! Specification parser.

use super::section::MarkdownLines;
use crate::models::{Objective, Requirement, RequirementType, SpecContent};

const FUNCTIONAL_SECTIONS: &[&str] = &["Requirements", "Functional Requirements"];
const NON_FUNCTIONAL_SECTIONS: &[&str] =
    &["Non-Functional Requirements", "Nonfunctional Requirements"];

/// Parse a specification document. Missing sections leave fields empty.
pub fn parse_spec(markdown: &str) -> SpecContent {
    let _span = charter_telemetry::parse_span("spec").entered();
    let doc = MarkdownLines::new(markdown);

    let overview = doc
        .sections(&["Overview"])
        .into_iter()
        .next()
        .map(|range| doc.text(range))
        .filter(|text| !text.is_empty());

    let objectives = collect_bullets(&doc, &["Objectives"])
        .into_iter()
        .map(Objective::new)
        .collect();

    let mut requirements =
        typed_requirements(&doc, FUNCTIONAL_SECTIONS, RequirementType::Functional);
    requirements.extend(typed_requirements(
        &doc,
        NON_FUNCTIONAL_SECTIONS,
        RequirementType::NonFunctional,
    ));

    let spec = SpecContent {
        title: doc.first_heading(1).map(str::to_string),
        overview,
        objectives,
        requirements,
        acceptance_criteria: collect_bullets(&doc, &["Acceptance Criteria"]),
        raw_markdown: markdown.to_string(),
    };

    tracing::debug!(
        title = ?spec.title,
        objectives = spec.objectives.len(),
        requirements = spec.requirements.len(),
        acceptance_criteria = spec.acceptance_criteria.len(),
        "Parsed spec"
    );
    spec
}

fn collect_bullets(doc: &MarkdownLines<'_>, titles: &[&str]) -> Vec<String> {
    doc.sections(titles)
        .into_iter()
        .flat_map(|range| doc.bullets(range))
        .collect()
}

fn typed_requirements(
    doc: &MarkdownLines<'_>,
    titles: &[&str],
    requirement_type: RequirementType,
) -> Vec<Requirement> {
    collect_bullets(doc, titles)
        .into_iter()
        .map(|description| Requirement {
            description,
            requirement_type: Some(requirement_type),
        })
        .collect()
}
