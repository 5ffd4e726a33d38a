//! Markdown rendering of validation reports.

use crate::models::{IssueSeverity, RuleCategory, ValidationIssue, ValidationReport};

/// Render `report` as a markdown document.
///
/// The layout is fixed: header, summary table, category table, issues grouped
/// as errors, warnings then info, and finally recommendations. The only
/// varying input besides the report contents is its timestamp.
pub fn format_report_as_markdown(report: &ValidationReport) -> String {
    let result = &report.result;
    let mut md = String::new();

    md.push_str("# Specification Validation Report\n\n");
    md.push_str(&format!(
        "**Generated**: {}\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "**Status**: {}\n\n",
        if result.valid { "Valid" } else { "Invalid" }
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Score | {}/100 |\n", result.score));
    md.push_str(&format!("| Rules Checked | {} |\n", result.checked_constraints));
    md.push_str(&format!("| Rules Passed | {} |\n", result.passed_constraints));
    md.push_str(&format!("| Errors | {} |\n", result.error_count()));
    md.push_str(&format!("| Warnings | {} |\n", result.warning_count()));
    md.push_str(&format!("| Info | {} |\n\n", result.info_count()));

    md.push_str("## Category Breakdown\n\n");
    md.push_str("| Category | Checked | Passed |\n");
    md.push_str("|----------|---------|--------|\n");
    for category in RuleCategory::ALL {
        let breakdown = report.categories.get(category);
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            category.label(),
            breakdown.checked,
            breakdown.passed
        ));
    }
    md.push('\n');

    md.push_str("## Issues\n\n");
    if result.issues.is_empty() {
        md.push_str("No issues found.\n\n");
    } else {
        for severity in IssueSeverity::ALL {
            let group: Vec<&ValidationIssue> = result
                .issues
                .iter()
                .filter(|issue| issue.severity == severity)
                .collect();
            if group.is_empty() {
                continue;
            }
            md.push_str(&format!("### {} ({})\n\n", severity.heading(), group.len()));
            for issue in group {
                md.push_str(&format!("- **{}**: {}\n", issue.code, issue.message));
                if let Some(suggestion) = &issue.suggestion {
                    md.push_str(&format!("  - Suggestion: {}\n", suggestion));
                }
            }
            md.push('\n');
        }
    }

    md.push_str("## Recommendations\n\n");
    if report.recommendations.is_empty() {
        md.push_str("- No changes recommended.\n");
    } else {
        for line in &report.recommendations {
            md.push_str(&format!("- {}\n", line));
        }
    }

    md
}
