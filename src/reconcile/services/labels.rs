//! Label application and commit status with stale risk-label diffing.

use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::reconcile::format::LabelMapper;
use crate::task::domain::TaskId;
use crate::task::ports::TaskRepository;
use crate::vcs::domain::CommitStatusRequest;
use crate::vcs::ports::VcsClient;

/// Applies review labels and sets the commit status on the MR head.
#[derive(Clone)]
pub struct LabelStatusPoster {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
    mapper: LabelMapper,
    status_name: String,
}

impl LabelStatusPoster {
    /// Creates a poster reporting statuses under the given context name.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        vcs: Arc<dyn VcsClient>,
        status_name: impl Into<String>,
    ) -> Self {
        Self {
            tasks,
            vcs,
            mapper: LabelMapper::new(),
            status_name: status_name.into(),
        }
    }

    /// Applies labels and commit status for a completed review task.
    ///
    /// Risk labels not in the new set are removed first so an incremental
    /// review never leaves two conflicting risk tiers on the merge
    /// request. Removal failures are logged and do not block applying the
    /// correct labels; idempotent conflicts on adding are success.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the repository or a non-idempotent
    /// API call fail.
    pub async fn post(&self, task_id: TaskId) -> Result<(), ReconcileError> {
        let Some(task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "label poster: task not found");
            return Ok(());
        };
        let Some(mr_iid) = task.mr_iid() else {
            info!(task_id = %task_id, "label poster: task has no MR, skipping");
            return Ok(());
        };
        let Some(result) = task.result().and_then(|result| result.as_code_review()) else {
            info!(task_id = %task_id, "label poster: task has no review result, skipping");
            return Ok(());
        };

        let labels = self.mapper.map_labels(result);
        let commit_state = self.mapper.map_commit_status(result);
        let gitlab_project = task.project().gitlab_project_id;

        let mr = self.vcs.merge_request(gitlab_project, mr_iid).await?;

        let stale = self.mapper.stale_risk_labels(&labels);
        if !stale.is_empty() {
            match self
                .vcs
                .remove_mr_labels(gitlab_project, mr_iid, &stale)
                .await
            {
                Ok(()) => {
                    info!(task_id = %task_id, removed = ?stale, "label poster: stale risk labels removed");
                }
                Err(err) => {
                    // Applying correct labels matters more than removing stale ones.
                    warn!(task_id = %task_id, error = %err, "label poster: failed to remove stale labels");
                }
            }
        }

        match self.vcs.add_mr_labels(gitlab_project, mr_iid, &labels).await {
            Ok(()) => {
                info!(task_id = %task_id, labels = ?labels, "label poster: labels applied");
            }
            Err(err) if err.is_idempotent_conflict() => {
                info!(task_id = %task_id, "label poster: labels already present");
            }
            Err(err) => return Err(err.into()),
        }

        self.vcs
            .set_commit_status(
                gitlab_project,
                &mr.head_sha,
                &CommitStatusRequest {
                    state: commit_state,
                    name: self.status_name.clone(),
                    description: "Vunnix AI Code Review".to_owned(),
                },
            )
            .await?;
        info!(
            task_id = %task_id,
            sha = mr.head_sha.as_str(),
            status = commit_state.as_str(),
            "label poster: commit status set"
        );
        Ok(())
    }
}
