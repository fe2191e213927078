//! Summary comment rendering.

use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::task::domain::{CodeReviewResult, RiskLevel, Severity};

/// The fixed-section summary document: header, risk badge and counts,
/// collapsible walkthrough, collapsible findings table, and an optional
/// re-review marker for incremental reviews.
const SUMMARY_TEMPLATE: &str = "\
## 🤖 AI Code Review

**Risk Level:** {{ risk_badge }} | **Issues Found:** {{ issue_count }} | **Files Changed:** {{ files_changed }}

<details>
<summary>📋 Walkthrough</summary>

| File | Change |
|------|--------|
{% for entry in walkthrough -%}
| `{{ entry.file }}` | {{ entry.change_summary }} |
{% endfor -%}

</details>

<details>
<summary>🔍 Findings Summary</summary>

| # | Severity | Category | File | Description |
|---|----------|----------|------|-------------|
{% for finding in findings -%}
| {{ finding.id }} | {{ finding.severity_badge }} | {{ finding.category }} | `{{ finding.location }}` | {{ finding.title }} |
{% endfor -%}

</details>
{%- if re_reviewed_at %}

🔄 _Re-reviewed after new commits: {{ re_reviewed_at }}_
{%- endif %}
";

#[derive(Debug, Serialize)]
struct WalkthroughRow {
    file: String,
    change_summary: String,
}

#[derive(Debug, Serialize)]
struct FindingRow {
    id: u32,
    severity_badge: String,
    category: String,
    location: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct SummaryContext {
    risk_badge: String,
    issue_count: u32,
    files_changed: usize,
    walkthrough: Vec<WalkthroughRow>,
    findings: Vec<FindingRow>,
    re_reviewed_at: Option<String>,
}

/// Error from template rendering.
#[derive(Debug, Clone, Error)]
#[error("summary template rendering failed: {0}")]
pub struct SummaryFormatError(String);

/// Renders a review result into the fixed-section markdown document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryCommentFormatter;

impl SummaryCommentFormatter {
    /// Creates a formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Renders the summary document.
    ///
    /// `re_reviewed_at` marks an incremental review: a timestamp line is
    /// appended so the updated comment is distinguishable from the first
    /// review's summary.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryFormatError`] when template rendering fails.
    pub fn format(
        &self,
        result: &CodeReviewResult,
        re_reviewed_at: Option<DateTime<Utc>>,
    ) -> Result<String, SummaryFormatError> {
        let context = SummaryContext {
            risk_badge: risk_badge(result.summary.risk_level).to_owned(),
            issue_count: result.summary.total_findings,
            files_changed: result.summary.walkthrough.len(),
            walkthrough: result
                .summary
                .walkthrough
                .iter()
                .map(|entry| WalkthroughRow {
                    file: entry.file.clone(),
                    change_summary: entry.change_summary.clone(),
                })
                .collect(),
            findings: result
                .findings
                .iter()
                .map(|finding| FindingRow {
                    id: finding.id,
                    severity_badge: severity_badge(finding.severity).to_owned(),
                    category: capitalize(&finding.category),
                    location: format!("{}:{}", finding.file, finding.line),
                    title: finding.title.clone(),
                })
                .collect(),
            re_reviewed_at: re_reviewed_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        };

        Environment::new()
            .render_str(SUMMARY_TEMPLATE, context)
            .map_err(|err| SummaryFormatError(err.to_string()))
    }
}

const fn risk_badge(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "🔴 High",
        RiskLevel::Medium => "🟡 Medium",
        RiskLevel::Low => "🟢 Low",
    }
}

const fn severity_badge(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴 Critical",
        Severity::Major => "🟡 Major",
        Severity::Minor => "🟢 Minor",
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
