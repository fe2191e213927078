//! Tests for the posting services against the recording VCS double.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::support::{
    FixedClock, PROJECT, ai_thread, finding, human_thread, mr_info, new_review_task,
    review_result, sample_instant,
};
use crate::reconcile::services::{LabelStatusPoster, SummaryPoster, ThreadPoster};
use crate::task::adapters::memory::InMemoryTaskRepository;
use crate::task::domain::{RiskLevel, Severity, Task, TaskResult, TaskStatus};
use crate::task::ports::TaskRepository;
use crate::vcs::adapters::InMemoryVcsClient;
use crate::vcs::domain::{CommitState, MrIid, NoteId};

struct PosterHarness {
    tasks: Arc<InMemoryTaskRepository>,
    vcs: Arc<InMemoryVcsClient>,
    clock: Arc<FixedClock>,
}

#[fixture]
fn harness() -> PosterHarness {
    let vcs = Arc::new(InMemoryVcsClient::new());
    vcs.insert_merge_request(PROJECT.gitlab_project_id, mr_info(10));
    PosterHarness {
        tasks: Arc::new(InMemoryTaskRepository::new()),
        vcs,
        clock: Arc::new(FixedClock(sample_instant())),
    }
}

impl PosterHarness {
    fn summary_poster(&self) -> SummaryPoster {
        SummaryPoster::new(self.tasks.clone(), self.vcs.clone(), self.clock.clone())
    }

    fn thread_poster(&self) -> ThreadPoster {
        ThreadPoster::new(self.tasks.clone(), self.vcs.clone())
    }

    fn label_poster(&self) -> LabelStatusPoster {
        LabelStatusPoster::new(self.tasks.clone(), self.vcs.clone(), "vunnix-code-review")
    }

    /// Creates a completed review task carrying the given result.
    async fn completed_review(
        &self,
        result: crate::task::domain::CodeReviewResult,
        comment_id: Option<NoteId>,
    ) -> Task {
        let mut task = self
            .tasks
            .create(new_review_task(10))
            .await
            .expect("create task");
        task.transition_to(TaskStatus::Running, &*self.clock)
            .expect("queued to running");
        if let Some(note_id) = comment_id {
            task.record_comment_id(note_id);
        }
        task.record_result(TaskResult::CodeReview(result));
        task.transition_to(TaskStatus::Completed, &*self.clock)
            .expect("running to completed");
        self.tasks.update(&task).await.expect("persist");
        task
    }
}

// ── summary poster ──────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_summary_creates_a_note_and_stores_its_id(harness: PosterHarness) {
    let task = harness
        .completed_review(review_result(RiskLevel::Low, vec![]), None)
        .await;

    harness
        .summary_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    let notes = harness.vcs.created_mr_notes();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].body.starts_with("## 🤖 AI Code Review"));
    let stored = harness
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.comment_id(), Some(notes[0].note_id));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn summary_with_comment_id_updates_in_place(harness: PosterHarness) {
    let task = harness
        .completed_review(review_result(RiskLevel::Low, vec![]), Some(NoteId::new(500)))
        .await;

    harness
        .summary_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    assert!(harness.vcs.created_mr_notes().is_empty());
    let updates = harness.vcs.note_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].note_id, NoteId::new(500));
    assert!(!updates[0].body.contains("Re-reviewed after new commits"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn incremental_summary_carries_the_re_review_marker(harness: PosterHarness) {
    // An earlier completed review holds the same comment id.
    harness
        .completed_review(review_result(RiskLevel::Low, vec![]), Some(NoteId::new(500)))
        .await;
    let second = harness
        .completed_review(review_result(RiskLevel::Medium, vec![]), Some(NoteId::new(500)))
        .await;

    harness
        .summary_poster()
        .post(second.id())
        .await
        .expect("posting succeeds");

    let updates = harness.vcs.note_updates();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].body.contains("Re-reviewed after new commits"));
}

// ── thread poster ───────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn threads_are_posted_for_critical_and_major_only(harness: PosterHarness) {
    let task = harness
        .completed_review(
            review_result(
                RiskLevel::Medium,
                vec![
                    finding(1, Severity::Critical, "bug", "src/a.php", "Crash"),
                    finding(2, Severity::Minor, "style", "src/b.php", "Nit"),
                    finding(3, Severity::Major, "bug", "src/c.php", "Leak"),
                ],
            ),
            None,
        )
        .await;

    harness
        .thread_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    let discussions = harness.vcs.created_discussions();
    assert_eq!(discussions.len(), 2);
    assert_eq!(discussions[0].position.new_path, "src/a.php");
    assert_eq!(discussions[0].position.new_line, 11);
    assert_eq!(discussions[1].position.new_path, "src/c.php");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_findings_are_not_posted_again(harness: PosterHarness) {
    // A prior review already posted a thread for the leak in src/a.php.
    harness
        .vcs
        .insert_discussion(PROJECT.gitlab_project_id, MrIid::new(10), ai_thread("src/a.php", 11, "Leak"));
    // A human thread quoting the same title must not suppress posting.
    harness.vcs.insert_discussion(
        PROJECT.gitlab_project_id,
        MrIid::new(10),
        human_thread("src/d.php", "Is this the same Leak?"),
    );

    let task = harness
        .completed_review(
            review_result(
                RiskLevel::Medium,
                vec![
                    finding(1, Severity::Major, "bug", "src/a.php", "Leak"),
                    finding(2, Severity::Major, "bug", "src/d.php", "Race condition"),
                ],
            ),
            None,
        )
        .await;

    harness
        .thread_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    let discussions = harness.vcs.created_discussions();
    assert_eq!(discussions.len(), 1, "only the new finding gets a thread");
    assert_eq!(discussions[0].position.new_path, "src/d.php");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn minor_only_results_post_no_threads(harness: PosterHarness) {
    let task = harness
        .completed_review(
            review_result(
                RiskLevel::Low,
                vec![finding(1, Severity::Minor, "style", "src/a.php", "Nit")],
            ),
            None,
        )
        .await;

    harness
        .thread_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    assert!(harness.vcs.created_discussions().is_empty());
}

// ── label and status poster ─────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn labels_and_commit_status_follow_the_result(harness: PosterHarness) {
    let task = harness
        .completed_review(
            review_result(
                RiskLevel::High,
                vec![finding(1, Severity::Critical, "security", "src/a.php", "Injection")],
            ),
            None,
        )
        .await;

    harness
        .label_poster()
        .post(task.id())
        .await
        .expect("posting succeeds");

    let added = harness.vcs.added_labels();
    assert_eq!(added.len(), 1);
    assert_eq!(
        added[0].labels,
        vec![
            "ai::reviewed".to_owned(),
            "ai::risk-high".to_owned(),
            "ai::security".to_owned(),
        ]
    );

    let removed = harness.vcs.removed_labels();
    assert_eq!(removed.len(), 1);
    assert_eq!(
        removed[0].labels,
        vec!["ai::risk-medium".to_owned(), "ai::risk-low".to_owned()]
    );

    let statuses = harness.vcs.commit_statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].state, CommitState::Failed);
    assert_eq!(statuses[0].sha, "headsha");
    assert_eq!(statuses[0].name, "vunnix-code-review");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_label_conflicts_are_swallowed(harness: PosterHarness) {
    harness.vcs.fail_next_label_add_with_conflict();
    let task = harness
        .completed_review(review_result(RiskLevel::Low, vec![]), None)
        .await;

    harness
        .label_poster()
        .post(task.id())
        .await
        .expect("conflict must not surface");

    // The status still lands even though the label add conflicted.
    assert_eq!(harness.vcs.commit_statuses().len(), 1);
    assert_eq!(
        harness.vcs.commit_statuses()[0].state,
        CommitState::Success
    );
}
