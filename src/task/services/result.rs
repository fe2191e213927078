//! Executor result validation and processing.

use mockable::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::queue::{Job, JobQueue, JobQueueError};
use crate::task::domain::{
    Intent, PromptVersion, Task, TaskResult, TaskStatus, TaskType, TokenUsage,
};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::task::services::CostCalculator;

/// Executor-reported outcome of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    /// The executor finished and submitted a structured result.
    Completed,
    /// The executor failed before producing a result.
    Failed,
}

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Field name to messages.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Records a failure message for a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Returns whether any failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A structurally valid result submission.
///
/// Structural validation covers presence and primitive shape only; whether
/// the `result` payload matches the task type's schema is the processor's
/// concern, and a mismatch there fails the task rather than the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSubmission {
    /// Executor-reported outcome.
    pub status: SubmissionStatus,
    /// Structured result payload, required for completed submissions.
    pub result: Option<serde_json::Value>,
    /// Short machine-readable error code.
    pub error: Option<String>,
    /// Descriptive error message, preferred over the code for display.
    pub error_message: Option<String>,
    /// Token counts.
    pub tokens: TokenUsage,
    /// Executor wall-clock duration in seconds.
    pub duration_seconds: u64,
    /// Prompt and schema provenance.
    pub prompt_version: PromptVersion,
}

impl ResultSubmission {
    /// Validates a raw submission body, collecting per-field errors.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming every missing or malformed
    /// field.
    pub fn validate(body: &serde_json::Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let status = match body.get("status").and_then(serde_json::Value::as_str) {
            Some("completed") => Some(SubmissionStatus::Completed),
            Some("failed") => Some(SubmissionStatus::Failed),
            Some(other) => {
                errors.add("status", format!("must be completed or failed, got {other}"));
                None
            }
            None => {
                errors.add("status", "is required");
                None
            }
        };

        let tokens = match body.get("tokens") {
            Some(value) => match serde_json::from_value::<TokenUsage>(value.clone()) {
                Ok(tokens) => Some(tokens),
                Err(err) => {
                    errors.add("tokens", format!("is malformed: {err}"));
                    None
                }
            },
            None => {
                errors.add("tokens", "is required");
                None
            }
        };

        let duration_seconds = match body
            .get("duration_seconds")
            .and_then(serde_json::Value::as_u64)
        {
            Some(value) => Some(value),
            None => {
                errors.add("duration_seconds", "is required");
                None
            }
        };

        let prompt_version = match body.get("prompt_version") {
            Some(value) => match serde_json::from_value::<PromptVersion>(value.clone()) {
                Ok(version) => Some(version),
                Err(err) => {
                    errors.add("prompt_version", format!("is malformed: {err}"));
                    None
                }
            },
            None => {
                errors.add("prompt_version", "is required");
                None
            }
        };

        let result = body.get("result").cloned();
        if status == Some(SubmissionStatus::Completed) && result.is_none() {
            errors.add("result", "is required when status is completed");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let (Some(status), Some(tokens), Some(duration_seconds), Some(prompt_version)) =
            (status, tokens, duration_seconds, prompt_version)
        else {
            return Err(errors);
        };

        Ok(Self {
            status,
            result,
            error: body
                .get("error")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
            error_message: body
                .get("error_message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned),
            tokens,
            duration_seconds,
            prompt_version,
        })
    }
}

/// Errors from result processing.
#[derive(Debug, Error)]
pub enum ResultProcessorError {
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The job queue rejected a reconciliation job.
    #[error(transparent)]
    Queue(#[from] JobQueueError),
}

/// Validates results against the task type's schema, records accounting,
/// transitions the task, and fans out reconciliation jobs.
#[derive(Clone)]
pub struct ResultProcessor {
    tasks: Arc<dyn TaskRepository>,
    queue: Arc<dyn JobQueue>,
    cost: CostCalculator,
    clock: Arc<dyn Clock>,
}

impl ResultProcessor {
    /// Creates a processor.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        queue: Arc<dyn JobQueue>,
        cost: CostCalculator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            queue,
            cost,
            clock,
        }
    }

    /// Processes a structurally valid submission for a running task.
    ///
    /// Returns the task's resulting status. Worker-reported failures and
    /// schema mismatches transition the task to `Failed` without any
    /// reconciliation fan-out; only valid completed results reconcile.
    ///
    /// # Errors
    ///
    /// Returns [`ResultProcessorError`] when persistence or enqueueing
    /// fail. State conflicts are not errors here — the caller checked the
    /// task was running, and a lost race surfaces as a failed transition
    /// logged and ignored.
    pub async fn process(
        &self,
        mut task: Task,
        submission: ResultSubmission,
    ) -> Result<TaskStatus, ResultProcessorError> {
        let cost = self.cost.cost(submission.tokens);
        task.record_accounting(
            submission.tokens,
            cost,
            submission.duration_seconds,
            submission.prompt_version.clone(),
        );

        if submission.status == SubmissionStatus::Failed {
            let reason = submission
                .error_message
                .clone()
                .or_else(|| submission.error.clone())
                .unwrap_or_else(|| "executor_failure".to_owned());
            return self.fail_task(task, &reason).await;
        }

        let payload = submission.result.clone().unwrap_or_default();
        let result = match TaskResult::from_submission(task.task_type(), payload) {
            Ok(result) => result,
            Err(err) => {
                warn!(task_id = %task.id(), error = %err, "result schema validation failed");
                return self
                    .fail_task(task, &format!("Schema validation failed: {err}"))
                    .await;
            }
        };
        task.record_result(result);

        if let Err(err) = task.transition_to(TaskStatus::Completed, &*self.clock) {
            info!(task_id = %task.id(), error = %err, "task already transitioned, skipping");
            return Ok(task.status());
        }
        self.tasks.update(&task).await?;

        info!(
            task_id = %task.id(),
            task_type = %task.task_type(),
            tokens_used = submission.tokens.total(),
            "task completed"
        );

        self.fan_out(&task).await?;
        Ok(TaskStatus::Completed)
    }

    async fn fail_task(
        &self,
        mut task: Task,
        reason: &str,
    ) -> Result<TaskStatus, ResultProcessorError> {
        if let Err(err) = task.fail(reason, &*self.clock) {
            info!(task_id = %task.id(), error = %err, "task already transitioned, cannot fail");
            return Ok(task.status());
        }
        self.tasks.update(&task).await?;
        info!(task_id = %task.id(), reason = reason, "task failed");
        Ok(TaskStatus::Failed)
    }

    /// Enqueues the type-specific reconciliation jobs.
    async fn fan_out(&self, task: &Task) -> Result<(), ResultProcessorError> {
        match task.task_type() {
            TaskType::CodeReview => {
                if task.mr_iid().is_some() {
                    self.queue
                        .enqueue(Job::PostSummaryComment(task.id()))
                        .await?;
                    self.queue
                        .enqueue(Job::PostInlineThreads(task.id()))
                        .await?;
                    self.queue
                        .enqueue(Job::PostLabelsAndStatus(task.id()))
                        .await?;
                }
            }
            TaskType::FeatureDev | TaskType::UiAdjustment => {
                self.queue
                    .enqueue(Job::PostFeatureDevResult(task.id()))
                    .await?;
            }
            TaskType::IssueDiscussion => {
                let answerable = matches!(
                    task.intent(),
                    Intent::AskCommand | Intent::IssueDiscussion
                );
                if answerable {
                    self.queue
                        .enqueue(Job::PostAnswerComment(task.id()))
                        .await?;
                }
            }
            TaskType::PrdCreation => {}
        }
        Ok(())
    }
}
