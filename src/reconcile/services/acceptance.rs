//! Acceptance correlation after merges and pushes.
//!
//! Neither path is a task: both are background jobs that read GitLab state
//! and hand records to the analytics collaborator.

use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::config::{AcceptanceSink, CodeChangeCorrelation, FindingAcceptanceRecord, ThreadState};
use crate::reconcile::format::{finding_matches_thread, is_ai_authored};
use crate::task::domain::ProjectRef;
use crate::task::ports::TaskRepository;
use crate::vcs::domain::MrIid;
use crate::vcs::ports::VcsClient;

/// Correlates review findings with thread resolution state at merge time
/// and records push ranges for code-change correlation.
#[derive(Clone)]
pub struct AcceptanceTracker {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
    sink: Arc<dyn AcceptanceSink>,
}

impl AcceptanceTracker {
    /// Creates a tracker.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        vcs: Arc<dyn VcsClient>,
        sink: Arc<dyn AcceptanceSink>,
    ) -> Self {
        Self { tasks, vcs, sink }
    }

    /// Correlates every completed review's actionable findings with the
    /// discussion threads on a just-merged merge request.
    ///
    /// Findings whose thread disappeared (or never matched) count as
    /// dismissed. Only critical/major findings are tracked — minor ones
    /// never had threads.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the repository, the discussions
    /// API, or the sink fail.
    pub async fn track_merge(
        &self,
        project: ProjectRef,
        mr_iid: MrIid,
    ) -> Result<(), ReconcileError> {
        let reviews = self
            .tasks
            .completed_reviews_for_merge_request(project.project_id, mr_iid)
            .await?;
        if reviews.is_empty() {
            info!(mr_iid = %mr_iid, "acceptance: no completed review tasks for MR");
            return Ok(());
        }

        let ai_threads: Vec<_> = self
            .vcs
            .list_mr_discussions(project.gitlab_project_id, mr_iid)
            .await?
            .into_iter()
            .filter(is_ai_authored)
            .collect();

        let mut tracked = 0;
        for task in &reviews {
            let Some(result) = task.result().and_then(|result| result.as_code_review()) else {
                continue;
            };
            for finding in &result.findings {
                if !finding.severity.warrants_inline_thread() {
                    continue;
                }
                let matched = ai_threads
                    .iter()
                    .find(|discussion| finding_matches_thread(finding, discussion));
                let state = matched.map_or(ThreadState::Dismissed, |discussion| {
                    let resolved = discussion
                        .first_note()
                        .is_some_and(|note| note.resolved);
                    if resolved {
                        ThreadState::Resolved
                    } else {
                        ThreadState::Unresolved
                    }
                });
                self.sink
                    .record_finding(FindingAcceptanceRecord {
                        task_id: task.id(),
                        finding_id: finding.id,
                        project_id: project.project_id,
                        mr_iid,
                        file: finding.file.clone(),
                        title: finding.title.clone(),
                        discussion_id: matched.map(|discussion| discussion.id.clone()),
                        state,
                    })
                    .await?;
                tracked += 1;
            }
        }
        info!(mr_iid = %mr_iid, findings_tracked = tracked, "acceptance tracking completed");
        Ok(())
    }

    /// Records a push's commit range against the open merge request for
    /// later finding correlation.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the sink fails.
    pub async fn correlate_push(
        &self,
        project: ProjectRef,
        mr_iid: MrIid,
        before_sha: &str,
        after_sha: &str,
    ) -> Result<(), ReconcileError> {
        if before_sha.is_empty() || after_sha.is_empty() {
            warn!(mr_iid = %mr_iid, "acceptance: push correlation missing commit range");
            return Ok(());
        }
        self.sink
            .record_code_change(CodeChangeCorrelation {
                project_id: project.project_id,
                mr_iid,
                before_sha: before_sha.to_owned(),
                after_sha: after_sha.to_owned(),
            })
            .await?;
        info!(mr_iid = %mr_iid, "acceptance: code change recorded");
        Ok(())
    }
}
