//! Merge request creation and issue summary for feature-dev results.

use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::task::domain::{FeatureDevResult, TaskId};
use crate::task::ports::TaskRepository;
use crate::vcs::domain::{MergeRequestUpdate, MrIid, NewMergeRequest};
use crate::vcs::ports::VcsClient;

/// Target branch feature branches merge into.
const TARGET_BRANCH: &str = "main";

/// Creates (or updates) the merge request for a feature-dev task and
/// posts a summary note on the originating issue.
///
/// The executor only pushes the branch; it runs sandboxed with the CI
/// trigger token and cannot create merge requests itself.
#[derive(Clone)]
pub struct FeatureDevPoster {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
}

impl FeatureDevPoster {
    /// Creates a poster.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>, vcs: Arc<dyn VcsClient>) -> Self {
        Self { tasks, vcs }
    }

    /// Reconciles a completed feature-dev task.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the repository or the merge
    /// request/note APIs fail.
    pub async fn post(&self, task_id: TaskId) -> Result<(), ReconcileError> {
        let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "feature-dev poster: task not found");
            return Ok(());
        };
        let Some(result) = task
            .result()
            .and_then(|result| result.as_feature_dev())
            .cloned()
        else {
            info!(task_id = %task_id, "feature-dev poster: task has no feature-dev result, skipping");
            return Ok(());
        };

        if result.branch.is_empty() || result.mr_title.is_empty() {
            warn!(task_id = %task_id, "feature-dev poster: missing branch or title in result");
            return Ok(());
        }

        let gitlab_project = task.project().gitlab_project_id;

        // A task that already targets an MR is an iteration on the same
        // branch: update the MR instead of opening a second one.
        let mr_iid = if let Some(existing) = task.mr_iid() {
            self.vcs
                .update_merge_request(
                    gitlab_project,
                    existing,
                    &MergeRequestUpdate {
                        title: Some(result.mr_title.clone()),
                        description: result.mr_description.clone(),
                    },
                )
                .await?;
            info!(task_id = %task_id, mr_iid = %existing, "feature-dev poster: existing MR updated");
            existing
        } else {
            let mr = self
                .vcs
                .create_merge_request(
                    gitlab_project,
                    &NewMergeRequest {
                        source_branch: result.branch.clone(),
                        target_branch: TARGET_BRANCH.to_owned(),
                        title: result.mr_title.clone(),
                        description: result.mr_description.clone().unwrap_or_default(),
                    },
                )
                .await?;
            task.record_mr_iid(mr.iid);
            self.tasks.update(&task).await?;
            info!(
                task_id = %task_id,
                mr_iid = %mr.iid,
                branch = result.branch.as_str(),
                "feature-dev poster: merge request created"
            );
            mr.iid
        };

        if let Some(issue_iid) = task.issue_iid() {
            let body = format_issue_summary(&result, mr_iid);
            let note_id = self
                .vcs
                .create_issue_note(gitlab_project, issue_iid, &body)
                .await?;
            task.record_comment_id(note_id);
            self.tasks.update(&task).await?;
            info!(task_id = %task_id, issue_iid = %issue_iid, note_id = %note_id, "feature-dev poster: issue summary posted");
        }
        Ok(())
    }
}

fn format_issue_summary(result: &FeatureDevResult, mr_iid: MrIid) -> String {
    let tests_added = if result.tests_added {
        "✅ Yes"
    } else {
        "❌ No"
    };
    let mut lines = vec![
        "### 🤖 AI Feature Development Complete".to_owned(),
        String::new(),
        format!("**Merge Request:** !{mr_iid} — {}", result.mr_title),
        format!("**Branch:** `{}`", result.branch),
        format!("**Tests Added:** {tests_added}"),
        String::new(),
    ];

    if !result.files_changed.is_empty() {
        lines.push("**Files Changed:**".to_owned());
        for file in &result.files_changed {
            let icon = if file.action == "created" { "🆕" } else { "✏️" };
            lines.push(format!("- {icon} `{}` — {}", file.path, file.summary));
        }
        lines.push(String::new());
    }

    if let Some(notes) = result.notes.as_deref().filter(|notes| !notes.is_empty()) {
        lines.push("**Notes:**".to_owned());
        lines.push(notes.to_owned());
    }

    lines.join("\n")
}
