//! Create-or-update of the review summary comment.

use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::reconcile::format::SummaryCommentFormatter;
use crate::task::domain::TaskId;
use crate::task::ports::TaskRepository;
use crate::vcs::ports::VcsClient;

/// Posts the review summary, updating the placeholder (or a prior
/// review's summary) in place when a comment id is already recorded.
#[derive(Clone)]
pub struct SummaryPoster {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
    formatter: SummaryCommentFormatter,
    clock: Arc<dyn Clock>,
}

impl SummaryPoster {
    /// Creates a poster.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        vcs: Arc<dyn VcsClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            vcs,
            formatter: SummaryCommentFormatter::new(),
            clock,
        }
    }

    /// Posts or updates the summary comment for a completed review task.
    ///
    /// Tasks without a merge request or review result are skipped. An
    /// incremental review — detected by a prior completed review sharing
    /// the same comment id — gets a re-review timestamp line.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when rendering, the repository, or the
    /// note API fail.
    pub async fn post(&self, task_id: TaskId) -> Result<(), ReconcileError> {
        let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "summary poster: task not found");
            return Ok(());
        };
        let Some(mr_iid) = task.mr_iid() else {
            info!(task_id = %task_id, "summary poster: task has no MR, skipping");
            return Ok(());
        };
        let Some(result) = task.result().and_then(|result| result.as_code_review()) else {
            info!(task_id = %task_id, "summary poster: task has no review result, skipping");
            return Ok(());
        };

        let re_reviewed_at = match task.comment_id() {
            Some(comment_id) => self
                .tasks
                .completed_review_shares_comment(
                    task.project().project_id,
                    mr_iid,
                    comment_id,
                    task.id(),
                )
                .await?
                .then(|| self.clock.utc()),
            None => None,
        };

        let markdown = self.formatter.format(result, re_reviewed_at)?;
        let gitlab_project = task.project().gitlab_project_id;

        if let Some(comment_id) = task.comment_id() {
            self.vcs
                .update_mr_note(gitlab_project, mr_iid, comment_id, &markdown)
                .await?;
            info!(task_id = %task_id, note_id = %comment_id, "summary comment updated in place");
        } else {
            let note_id = self
                .vcs
                .create_mr_note(gitlab_project, mr_iid, &markdown)
                .await?;
            task.record_comment_id(note_id);
            self.tasks.update(&task).await?;
            info!(task_id = %task_id, note_id = %note_id, "summary comment posted");
        }
        Ok(())
    }
}
