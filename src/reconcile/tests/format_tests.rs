//! Unit tests for the pure reconciliation formatters.

use rstest::rstest;

use super::support::{ai_thread, finding, human_thread, review_result, sample_instant};
use crate::reconcile::format::{
    InlineThreadFormatter, LabelMapper, SummaryCommentFormatter, finding_matches_thread,
    is_ai_authored,
};
use crate::task::domain::{RiskLevel, Severity};
use crate::vcs::domain::CommitState;

// ── label mapping ───────────────────────────────────────────────────

#[rstest]
#[case(RiskLevel::High, "ai::risk-high")]
#[case(RiskLevel::Medium, "ai::risk-medium")]
#[case(RiskLevel::Low, "ai::risk-low")]
fn labels_carry_reviewed_and_exactly_one_risk_tier(
    #[case] risk: RiskLevel,
    #[case] expected: &str,
) {
    let labels = LabelMapper::new().map_labels(&review_result(risk, vec![]));

    assert!(labels.contains(&"ai::reviewed".to_owned()));
    assert_eq!(
        labels
            .iter()
            .filter(|label| label.starts_with("ai::risk-"))
            .collect::<Vec<_>>(),
        vec![expected]
    );
}

#[rstest]
fn security_label_follows_category_not_severity() {
    let mapper = LabelMapper::new();

    let with_minor_security = review_result(
        RiskLevel::Low,
        vec![finding(1, Severity::Minor, "security", "src/a.php", "Weak hash")],
    );
    let without_security = review_result(
        RiskLevel::High,
        vec![finding(1, Severity::Critical, "bug", "src/a.php", "Crash")],
    );

    assert!(
        mapper
            .map_labels(&with_minor_security)
            .contains(&"ai::security".to_owned())
    );
    assert!(
        !mapper
            .map_labels(&without_security)
            .contains(&"ai::security".to_owned())
    );
}

#[rstest]
fn commit_status_fails_iff_a_critical_finding_exists() {
    let mapper = LabelMapper::new();

    let critical = review_result(
        RiskLevel::Low,
        vec![finding(1, Severity::Critical, "bug", "src/a.php", "Crash")],
    );
    let majors_only = review_result(
        RiskLevel::High,
        vec![
            finding(1, Severity::Major, "bug", "src/a.php", "Leak"),
            finding(2, Severity::Major, "style", "src/b.php", "Nit"),
        ],
    );
    let empty = review_result(RiskLevel::Low, vec![]);

    assert_eq!(mapper.map_commit_status(&critical), CommitState::Failed);
    assert_eq!(mapper.map_commit_status(&majors_only), CommitState::Success);
    assert_eq!(mapper.map_commit_status(&empty), CommitState::Success);
}

#[rstest]
fn stale_risk_labels_are_the_other_two_tiers() {
    let mapper = LabelMapper::new();
    let labels = mapper.map_labels(&review_result(RiskLevel::Medium, vec![]));

    let stale = mapper.stale_risk_labels(&labels);

    assert_eq!(stale, vec!["ai::risk-high".to_owned(), "ai::risk-low".to_owned()]);
}

// ── inline thread formatting ────────────────────────────────────────

#[rstest]
fn only_critical_and_major_findings_warrant_threads() {
    let findings = vec![
        finding(1, Severity::Critical, "bug", "src/a.php", "Crash"),
        finding(2, Severity::Minor, "style", "src/b.php", "Nit"),
        finding(3, Severity::Major, "bug", "src/c.php", "Leak"),
    ];

    let actionable = InlineThreadFormatter::new().filter_actionable(&findings);

    assert_eq!(
        actionable.iter().map(|entry| entry.id).collect::<Vec<_>>(),
        vec![1, 3]
    );
}

#[rstest]
fn thread_body_opens_with_the_severity_tag() {
    let body = InlineThreadFormatter::new().format(&finding(
        1,
        Severity::Critical,
        "security",
        "src/a.php",
        "SQL injection",
    ));

    assert!(body.starts_with("🔴 **Critical** | Security"));
    assert!(body.contains("**SQL injection**"));
}

#[rstest]
fn suggestion_is_appended_when_present() {
    let mut subject = finding(1, Severity::Major, "bug", "src/a.php", "Leak");
    subject.suggestion = Some("```diff\n- leak()\n+ close()\n```".to_owned());

    let body = InlineThreadFormatter::new().format(&subject);

    assert!(body.contains("**Suggested fix:**"));
    assert!(body.contains("+ close()"));
}

#[rstest]
fn ai_threads_are_recognized_by_their_severity_tag() {
    assert!(is_ai_authored(&ai_thread("src/a.php", 11, "Leak")));
    assert!(!is_ai_authored(&human_thread(
        "src/a.php",
        "Can we rename this?"
    )));
}

#[rstest]
fn finding_matches_thread_on_file_and_title() {
    let thread = ai_thread("src/a.php", 11, "Leak");

    let same = finding(1, Severity::Major, "bug", "src/a.php", "Leak");
    let other_file = finding(2, Severity::Major, "bug", "src/b.php", "Leak");
    let other_title = finding(3, Severity::Major, "bug", "src/a.php", "Crash");

    assert!(finding_matches_thread(&same, &thread));
    assert!(!finding_matches_thread(&other_file, &thread));
    assert!(!finding_matches_thread(&other_title, &thread));
}

// ── summary rendering ───────────────────────────────────────────────

#[rstest]
fn summary_renders_the_fixed_sections() {
    let result = review_result(
        RiskLevel::Medium,
        vec![finding(1, Severity::Major, "bug", "src/a.php", "Leak")],
    );

    let markdown = SummaryCommentFormatter::new()
        .format(&result, None)
        .expect("template renders");

    assert!(markdown.starts_with("## 🤖 AI Code Review"));
    assert!(markdown.contains("**Risk Level:** 🟡 Medium"));
    assert!(markdown.contains("**Issues Found:** 1"));
    assert!(markdown.contains("📋 Walkthrough"));
    assert!(markdown.contains("🔍 Findings Summary"));
    assert!(markdown.contains("`src/a.php:11`"));
    assert!(!markdown.contains("Re-reviewed after new commits"));
}

#[rstest]
fn re_review_marker_carries_the_timestamp() {
    let result = review_result(RiskLevel::Low, vec![]);

    let markdown = SummaryCommentFormatter::new()
        .format(&result, Some(sample_instant()))
        .expect("template renders");

    assert!(markdown.contains("Re-reviewed after new commits: 2025-06-01 12:00:00 UTC"));
}
