//! Shared fixtures for reconciliation tests.

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::task::domain::{
    CodeReviewResult, Finding, Intent, NewTask, ProjectId, ProjectRef, ReviewSummary, RiskLevel,
    Severity, TaskOrigin, TaskPriority, TaskType, WalkthroughEntry,
};
use crate::vcs::domain::{
    DiffRefs, Discussion, DiscussionId, DiscussionNote, GitlabProjectId, MergeRequestInfo, MrIid,
    NotePosition,
};

/// Project reference shared by the fixtures.
pub const PROJECT: ProjectRef = ProjectRef::new(ProjectId::new(1), GitlabProjectId::new(42));

/// Clock pinned to a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A sample timestamp for deterministic fixtures.
#[must_use]
pub fn sample_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Creation parameters for a review task on the fixture project.
#[must_use]
pub fn new_review_task(mr_iid: u64) -> NewTask {
    NewTask {
        task_type: TaskType::CodeReview,
        priority: TaskPriority::Normal,
        origin: TaskOrigin::Webhook,
        project: PROJECT,
        user_id: None,
        mr_iid: Some(MrIid::new(mr_iid)),
        issue_iid: None,
        commit_sha: None,
        conversation_id: None,
        intent: Intent::AutoReview,
        question: None,
        created_at: sample_instant(),
    }
}

/// A finding with the given coordinates and severity.
#[must_use]
pub fn finding(id: u32, severity: Severity, category: &str, file: &str, title: &str) -> Finding {
    Finding {
        id,
        severity,
        category: category.to_owned(),
        file: file.to_owned(),
        line: 10 + id,
        end_line: None,
        title: title.to_owned(),
        description: format!("Details for {title}."),
        suggestion: None,
    }
}

/// A review result over the given findings.
#[must_use]
pub fn review_result(risk: RiskLevel, findings: Vec<Finding>) -> CodeReviewResult {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "test fixtures carry a handful of findings"
    )]
    let total = findings.len() as u32;
    CodeReviewResult {
        summary: ReviewSummary {
            risk_level: risk,
            total_findings: total,
            walkthrough: vec![WalkthroughEntry {
                file: "src/app.php".to_owned(),
                change_summary: "Reworked session handling".to_owned(),
            }],
        },
        findings,
    }
}

/// Merge request metadata for the fixture project.
#[must_use]
pub fn mr_info(iid: u64) -> MergeRequestInfo {
    MergeRequestInfo {
        iid: MrIid::new(iid),
        source_branch: format!("feature/branch-{iid}"),
        head_sha: "headsha".to_owned(),
        diff_refs: DiffRefs {
            base_sha: "base".to_owned(),
            start_sha: "start".to_owned(),
            head_sha: "headsha".to_owned(),
        },
    }
}

/// An inline discussion thread as a prior review would have posted it.
#[must_use]
pub fn ai_thread(file: &str, line: u32, title: &str) -> Discussion {
    Discussion {
        id: DiscussionId::new(format!("prior-{file}-{line}")),
        notes: vec![DiscussionNote {
            body: format!("🟡 **Major** | Bug\n\n**{title}**\n\nDetails for {title}."),
            position: Some(NotePosition {
                new_path: file.to_owned(),
                new_line: Some(line),
            }),
            resolved: false,
        }],
    }
}

/// A human-authored discussion thread.
#[must_use]
pub fn human_thread(file: &str, body: &str) -> Discussion {
    Discussion {
        id: DiscussionId::new(format!("human-{file}")),
        notes: vec![DiscussionNote {
            body: body.to_owned(),
            position: Some(NotePosition {
                new_path: file.to_owned(),
                new_line: Some(1),
            }),
            resolved: false,
        }],
    }
}
