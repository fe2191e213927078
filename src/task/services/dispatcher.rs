//! Dispatch of queued tasks to the external pipeline runner.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigResolver, ConfigResolverError};
use crate::task::domain::{ReviewStrategy, Task, TaskId, TaskStatus, TaskType};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::task::services::{StrategyResolver, TaskTokenService};
use crate::vcs::domain::MrIid;
use crate::vcs::ports::{PipelineTriggerRequest, VcsClient};

/// Placeholder posted while a first review runs.
const PLACEHOLDER_TEXT: &str = "🤖 AI Review in progress…";
/// Placeholder shown when a prior review's comment is being reused.
const RE_REVIEW_PLACEHOLDER_TEXT: &str =
    "🤖 AI Review in progress… (re-reviewing after new commits)";

/// Configuration key holding the project's CI trigger token.
const TRIGGER_TOKEN_KEY: &str = "ci_trigger_token";

/// Branch used when no merge request source branch can be resolved.
const DEFAULT_PIPELINE_REF: &str = "main";

/// Errors from the dispatcher.
///
/// Pipeline trigger failures and a missing trigger token are *not* errors
/// here: they fail the task itself and dispatch returns cleanly.
#[derive(Debug, Error)]
pub enum TaskDispatcherError {
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The configuration collaborator failed.
    #[error(transparent)]
    Config(#[from] ConfigResolverError),
}

/// Takes a queued task through strategy selection, placeholder posting,
/// token minting, and the pipeline trigger.
#[derive(Clone)]
pub struct TaskDispatcher {
    tasks: Arc<dyn TaskRepository>,
    vcs: Arc<dyn VcsClient>,
    config: Arc<dyn ConfigResolver>,
    tokens: TaskTokenService,
    strategy: StrategyResolver,
    clock: Arc<dyn Clock>,
}

impl TaskDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        vcs: Arc<dyn VcsClient>,
        config: Arc<dyn ConfigResolver>,
        tokens: TaskTokenService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            vcs,
            config,
            tokens,
            strategy: StrategyResolver::new(),
            clock,
        }
    }

    /// Dispatches a queued task to the external pipeline.
    ///
    /// A task that is no longer `Queued` (superseded while waiting) is
    /// skipped silently; trigger failures transition the task to `Failed`
    /// instead of erroring.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDispatcherError`] when persistence or configuration
    /// lookups fail.
    pub async fn dispatch(&self, task_id: TaskId) -> Result<(), TaskDispatcherError> {
        let Some(mut task) = self.tasks.find_by_id(task_id).await? else {
            warn!(task_id = %task_id, "dispatch requested for unknown task");
            return Ok(());
        };
        if task.status() != TaskStatus::Queued {
            info!(
                task_id = %task_id,
                status = task.status().as_str(),
                "task no longer queued, skipping dispatch"
            );
            return Ok(());
        }

        let strategy = self.resolve_strategy(&task).await;
        task.record_strategy(strategy);

        if task.task_type() == TaskType::CodeReview
            && let Some(mr_iid) = task.mr_iid()
        {
            self.ensure_placeholder(&mut task, mr_iid).await?;
        }

        let Some(trigger_token) = self.trigger_token(&task).await? else {
            warn!(task_id = %task_id, project_id = %task.project().project_id, "missing CI trigger token");
            if task.fail("missing_trigger_token", &*self.clock).is_ok() {
                self.tasks.update(&task).await?;
            }
            return Ok(());
        };

        let bearer = self.tokens.generate(task.id());
        let ref_name = self.resolve_pipeline_ref(&task).await;
        let variables = pipeline_variables(&task, strategy, &bearer);

        match self
            .vcs
            .trigger_pipeline(
                task.project().gitlab_project_id,
                &PipelineTriggerRequest {
                    ref_name,
                    trigger_token,
                    variables,
                },
            )
            .await
        {
            Ok(pipeline_id) => {
                task.record_pipeline_id(pipeline_id);
                if let Err(err) = task.transition_to(TaskStatus::Running, &*self.clock) {
                    warn!(task_id = %task_id, error = %err, "task superseded during trigger");
                    return Ok(());
                }
                self.tasks.update(&task).await?;
                info!(
                    task_id = %task_id,
                    pipeline_id = %pipeline_id,
                    strategy = strategy.as_str(),
                    "pipeline triggered"
                );
            }
            Err(err) => {
                warn!(task_id = %task_id, error = %err, "pipeline trigger failed");
                if task.fail("pipeline_trigger_failed", &*self.clock).is_ok() {
                    self.tasks.update(&task).await?;
                }
            }
        }
        Ok(())
    }

    /// Resolves the review strategy from the merge request diff.
    ///
    /// When the changed file list cannot be fetched, mixed review is the
    /// safe fallback since it covers both frontend and backend.
    async fn resolve_strategy(&self, task: &Task) -> ReviewStrategy {
        if task.task_type() == TaskType::CodeReview
            && let Some(mr_iid) = task.mr_iid()
        {
            return match self
                .vcs
                .merge_request_changed_paths(task.project().gitlab_project_id, mr_iid)
                .await
            {
                Ok(paths) => self.strategy.resolve(&paths),
                Err(err) => {
                    warn!(task_id = %task.id(), error = %err, "failed to fetch MR changes, defaulting to mixed-review");
                    ReviewStrategy::MixedReview
                }
            };
        }
        match task.task_type() {
            TaskType::UiAdjustment => ReviewStrategy::FrontendReview,
            _ => ReviewStrategy::BackendReview,
        }
    }

    /// Posts the in-progress placeholder, reusing the most recent earlier
    /// review comment on the same merge request when one exists.
    ///
    /// Placeholder failures never block dispatch; the review proceeds and
    /// the summary poster falls back to creating a fresh comment.
    async fn ensure_placeholder(
        &self,
        task: &mut Task,
        mr_iid: MrIid,
    ) -> Result<(), TaskDispatcherError> {
        if task.comment_id().is_some() {
            return Ok(());
        }

        let previous = self
            .tasks
            .previous_review_comment_id(task.project().project_id, mr_iid, task.id())
            .await?;

        if let Some(note_id) = previous {
            match self
                .vcs
                .update_mr_note(
                    task.project().gitlab_project_id,
                    mr_iid,
                    note_id,
                    RE_REVIEW_PLACEHOLDER_TEXT,
                )
                .await
            {
                Ok(()) => {
                    task.record_comment_id(note_id);
                    self.tasks.update(task).await?;
                    return Ok(());
                }
                Err(err) => {
                    warn!(task_id = %task.id(), error = %err, "failed to reuse previous comment, creating new");
                }
            }
        }

        match self
            .vcs
            .create_mr_note(task.project().gitlab_project_id, mr_iid, PLACEHOLDER_TEXT)
            .await
        {
            Ok(note_id) => {
                task.record_comment_id(note_id);
                self.tasks.update(task).await?;
            }
            Err(err) => {
                warn!(task_id = %task.id(), error = %err, "failed to post placeholder");
            }
        }
        Ok(())
    }

    async fn trigger_token(&self, task: &Task) -> Result<Option<String>, TaskDispatcherError> {
        let setting = self
            .config
            .get(task.project().project_id, TRIGGER_TOKEN_KEY)
            .await?;
        Ok(setting
            .and_then(|resolved| resolved.value.as_str().map(str::to_owned))
            .filter(|token| !token.is_empty()))
    }

    /// The trigger API only accepts branch names; for MR-backed tasks use
    /// the source branch, falling back to the default branch.
    async fn resolve_pipeline_ref(&self, task: &Task) -> String {
        if let Some(mr_iid) = task.mr_iid() {
            match self
                .vcs
                .merge_request(task.project().gitlab_project_id, mr_iid)
                .await
            {
                Ok(info) => return info.source_branch,
                Err(err) => {
                    warn!(task_id = %task.id(), error = %err, "failed to resolve MR source branch, falling back");
                }
            }
        }
        DEFAULT_PIPELINE_REF.to_owned()
    }
}

/// Variables handed to the executor via the pipeline trigger.
fn pipeline_variables(
    task: &Task,
    strategy: ReviewStrategy,
    bearer: &str,
) -> Vec<(String, String)> {
    let mut variables = vec![
        ("VUNNIX_TASK_ID".to_owned(), task.id().to_string()),
        (
            "VUNNIX_TASK_TYPE".to_owned(),
            task.task_type().as_str().to_owned(),
        ),
        ("VUNNIX_INTENT".to_owned(), task.intent().as_str().to_owned()),
        ("VUNNIX_TOKEN".to_owned(), bearer.to_owned()),
        ("VUNNIX_STRATEGY".to_owned(), strategy.as_str().to_owned()),
    ];
    if let Some(issue_iid) = task.issue_iid() {
        variables.push(("VUNNIX_ISSUE_IID".to_owned(), issue_iid.to_string()));
    }
    if let Some(question) = task.question() {
        variables.push(("VUNNIX_QUESTION".to_owned(), question.to_owned()));
    }
    variables
}
