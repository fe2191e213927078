//! Answer comment posting for ask commands and issue discussions.

use std::sync::Arc;
use tracing::{info, warn};

use super::ReconcileError;
use crate::task::domain::{AnswerResult, TaskId};
use crate::task::ports::TaskRepository;
use crate::vcs::ports::VcsClient;

/// Posts the executor's answer as a comment on the merge request or
/// issue the question came from.
#[derive(Clone)]
pub struct AnswerPoster {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
}

impl AnswerPoster {
    /// Creates a poster.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>, vcs: Arc<dyn VcsClient>) -> Self {
        Self { tasks, vcs }
    }

    /// Posts the answer comment for a completed ask/discussion task.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the repository or the note API
    /// fail.
    pub async fn post(&self, task_id: TaskId) -> Result<(), ReconcileError> {
        let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "answer poster: task not found");
            return Ok(());
        };
        let Some(result) = task.result().and_then(|result| result.as_answer()) else {
            info!(task_id = %task_id, "answer poster: task has no answer result, skipping");
            return Ok(());
        };

        let body = format_answer(result, task.question());
        let gitlab_project = task.project().gitlab_project_id;

        let note_id = if let Some(mr_iid) = task.mr_iid() {
            self.vcs
                .create_mr_note(gitlab_project, mr_iid, &body)
                .await?
        } else if let Some(issue_iid) = task.issue_iid() {
            self.vcs
                .create_issue_note(gitlab_project, issue_iid, &body)
                .await?
        } else {
            info!(task_id = %task_id, "answer poster: task has no MR or issue, skipping");
            return Ok(());
        };

        task.record_comment_id(note_id);
        self.tasks.update(&task).await?;
        info!(task_id = %task_id, note_id = %note_id, "answer poster: answer posted");
        Ok(())
    }
}

/// The original question is quoted above the answer so the comment stands
/// alone in the discussion history.
fn format_answer(result: &AnswerResult, task_question: Option<&str>) -> String {
    let question = result
        .question
        .as_deref()
        .or(task_question)
        .unwrap_or("Unknown question");
    format!("### 🤖 Answer\n\n> {question}\n\n{answer}", answer = result.answer)
}
