//! Inline discussion posting with incremental-review deduplication.

use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::reconcile::format::{InlineThreadFormatter, finding_matches_thread, is_ai_authored};
use crate::task::domain::TaskId;
use crate::task::ports::TaskRepository;
use crate::vcs::domain::DiffPosition;
use crate::vcs::ports::VcsClient;

/// Posts one resolvable discussion thread per critical/major finding,
/// skipping findings already covered by a prior review's thread.
#[derive(Clone)]
pub struct ThreadPoster {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
    formatter: InlineThreadFormatter,
}

impl ThreadPoster {
    /// Creates a poster.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>, vcs: Arc<dyn VcsClient>) -> Self {
        Self {
            tasks,
            vcs,
            formatter: InlineThreadFormatter::new(),
        }
    }

    /// Posts inline threads for a completed review task.
    ///
    /// Existing discussions are fetched first; threads recognized as
    /// AI-authored (severity-tag markup) suppress re-posting of findings
    /// with the same file and title — the incremental-review guarantee.
    /// Minor findings never get threads.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the repository or the discussions
    /// API fail; idempotent conflicts on creation are swallowed.
    pub async fn post(&self, task_id: TaskId) -> Result<(), ReconcileError> {
        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "thread poster: task not found");
            return Ok(());
        };
        let Some(mr_iid) = task.mr_iid() else {
            info!(task_id = %task_id, "thread poster: task has no MR, skipping");
            return Ok(());
        };
        let Some(result) = task.result().and_then(|result| result.as_code_review()) else {
            info!(task_id = %task_id, "thread poster: task has no review result, skipping");
            return Ok(());
        };

        let actionable = self.formatter.filter_actionable(&result.findings);
        if actionable.is_empty() {
            info!(task_id = %task_id, "thread poster: no critical/major findings, skipping");
            return Ok(());
        }

        let gitlab_project = task.project().gitlab_project_id;
        let mr = self.vcs.merge_request(gitlab_project, mr_iid).await?;
        let existing: Vec<_> = self
            .vcs
            .list_mr_discussions(gitlab_project, mr_iid)
            .await?
            .into_iter()
            .filter(is_ai_authored)
            .collect();

        for finding in actionable {
            let covered = existing
                .iter()
                .any(|discussion| finding_matches_thread(finding, discussion));
            if covered {
                info!(
                    task_id = %task_id,
                    finding_id = finding.id,
                    file = finding.file.as_str(),
                    "thread poster: finding already covered by earlier review"
                );
                continue;
            }

            let position = DiffPosition {
                diff_refs: mr.diff_refs.clone(),
                new_path: finding.file.clone(),
                new_line: finding.line,
            };
            let body = self.formatter.format(finding);
            match self
                .vcs
                .create_mr_discussion(gitlab_project, mr_iid, &body, &position)
                .await
            {
                Ok(discussion_id) => {
                    info!(
                        task_id = %task_id,
                        finding_id = finding.id,
                        discussion_id = %discussion_id,
                        "thread poster: created thread"
                    );
                }
                Err(err) if err.is_idempotent_conflict() => {
                    info!(task_id = %task_id, finding_id = finding.id, "thread poster: thread already exists");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
