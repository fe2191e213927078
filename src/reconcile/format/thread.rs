//! Inline thread formatting and AI-thread recognition.
//!
//! Thread bodies always open with a severity tag (`🔴 **Critical**`,
//! `🟡 **Major**`, `🟢 **Minor**`). That markup doubles as the signature
//! distinguishing Vunnix-authored threads from human discussion when an
//! incremental review deduplicates against existing threads.

use regex::Regex;
use std::sync::LazyLock;

use crate::task::domain::{Finding, Severity};
use crate::vcs::domain::Discussion;

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static SEVERITY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:🔴|🟡|🟢) \*\*(?:Critical|Major|Minor)\*\*").expect("valid tag pattern")
});

/// Returns whether a discussion thread was authored by Vunnix, judged by
/// the severity-tag markup of its first note.
#[must_use]
pub fn is_ai_authored(discussion: &Discussion) -> bool {
    discussion
        .first_note()
        .is_some_and(|note| SEVERITY_TAG.is_match(&note.body))
}

/// Returns whether an existing thread already covers a finding.
///
/// The match key is the thread position's file path plus the finding title
/// appearing in the body — the same signature acceptance tracking uses to
/// correlate findings with threads.
#[must_use]
pub fn finding_matches_thread(finding: &Finding, discussion: &Discussion) -> bool {
    discussion.first_note().is_some_and(|note| {
        let same_file = note
            .position
            .as_ref()
            .is_some_and(|position| position.new_path == finding.file);
        same_file && note.body.contains(&finding.title)
    })
}

/// Formats findings as inline discussion bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineThreadFormatter;

impl InlineThreadFormatter {
    /// Creates a formatter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the findings that warrant an inline thread, preserving
    /// order: critical and major only.
    #[must_use]
    pub fn filter_actionable<'a>(&self, findings: &'a [Finding]) -> Vec<&'a Finding> {
        findings
            .iter()
            .filter(|finding| finding.severity.warrants_inline_thread())
            .collect()
    }

    /// Formats one finding as a thread body.
    #[must_use]
    pub fn format(&self, finding: &Finding) -> String {
        let mut body = format!(
            "{tag} | {category}\n\n**{title}**\n\n{description}",
            tag = severity_tag(finding.severity),
            category = capitalize(&finding.category),
            title = finding.title,
            description = finding.description,
        );
        if let Some(suggestion) = &finding.suggestion {
            body.push_str("\n\n**Suggested fix:**\n\n");
            body.push_str(suggestion);
        }
        body
    }
}

const fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴 **Critical**",
        Severity::Major => "🟡 **Major**",
        Severity::Minor => "🟢 **Minor**",
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
