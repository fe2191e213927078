//! Task aggregate root and its forward-only state machine.

use super::{
    ConversationId, Intent, ProjectRef, PromptVersion, ReviewStrategy, TaskDomainError, TaskId,
    TaskResult, TokenUsage, UserId,
};
use crate::vcs::domain::{IssueIid, MrIid, NoteId, PipelineId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task lifecycle status.
///
/// Transitions move strictly forward; the three terminal states reject
/// every further mutation, so a finished task can never be resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, external pipeline not yet confirmed triggered.
    Queued,
    /// External pipeline id recorded; awaiting the result callback.
    Running,
    /// Result accepted and processed.
    Completed,
    /// Executor reported failure, or dispatch could not complete.
    Failed,
    /// Replaced by a newer task for the same merge request.
    Superseded,
}

impl TaskStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Superseded => "superseded",
        }
    }

    /// Returns whether a transition from `self` to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Queued => matches!(target, Self::Running | Self::Failed | Self::Superseded),
            Self::Running => matches!(
                target,
                Self::Completed | Self::Failed | Self::Superseded
            ),
            Self::Completed | Self::Failed | Self::Superseded => false,
        }
    }

    /// Returns whether this status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Superseded)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Review a merge request diff.
    CodeReview,
    /// Implement a feature from an issue.
    FeatureDev,
    /// Answer a question or discuss an issue.
    IssueDiscussion,
    /// Adjust UI from designer feedback.
    UiAdjustment,
    /// Draft a product requirements document.
    PrdCreation,
}

impl TaskType {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CodeReview => "code_review",
            Self::FeatureDev => "feature_dev",
            Self::IssueDiscussion => "issue_discussion",
            Self::UiAdjustment => "ui_adjustment",
            Self::PrdCreation => "prd_creation",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Background work (feature development).
    Low,
    /// Default priority.
    Normal,
    /// Explicitly requested reviews.
    High,
}

impl TaskPriority {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// How the task entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOrigin {
    /// Created from a webhook event.
    Webhook,
    /// Created from a chat conversation action.
    Conversation,
}

/// Parameter object for creating a task; the repository allocates the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Kind of work.
    pub task_type: TaskType,
    /// Dispatch priority.
    pub priority: TaskPriority,
    /// Creation origin.
    pub origin: TaskOrigin,
    /// Project the task belongs to.
    pub project: ProjectRef,
    /// Resolved internal user, when the actor is known.
    pub user_id: Option<UserId>,
    /// Merge request context, when applicable.
    pub mr_iid: Option<MrIid>,
    /// Issue context, when applicable.
    pub issue_iid: Option<IssueIid>,
    /// Commit SHA the work refers to, when known.
    pub commit_sha: Option<String>,
    /// Originating conversation, for chat-born tasks.
    pub conversation_id: Option<ConversationId>,
    /// Classified intent that produced the task.
    pub intent: Intent,
    /// Extracted question for ask-command tasks.
    pub question: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Task aggregate root.
///
/// The single serialization point of the pipeline: every status mutation
/// checks the state machine first and callers persist the whole aggregate
/// back through the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    status: TaskStatus,
    priority: TaskPriority,
    origin: TaskOrigin,
    project: ProjectRef,
    user_id: Option<UserId>,
    mr_iid: Option<MrIid>,
    issue_iid: Option<IssueIid>,
    commit_sha: Option<String>,
    conversation_id: Option<ConversationId>,
    intent: Intent,
    question: Option<String>,
    strategy: Option<ReviewStrategy>,
    comment_id: Option<NoteId>,
    pipeline_id: Option<PipelineId>,
    result: Option<TaskResult>,
    usage: Option<TokenUsage>,
    cost: Option<f64>,
    duration_seconds: Option<u64>,
    error_reason: Option<String>,
    retry_count: u32,
    prompt_version: Option<PromptVersion>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a queued task from creation parameters and an allocated id.
    #[must_use]
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            task_type: new.task_type,
            status: TaskStatus::Queued,
            priority: new.priority,
            origin: new.origin,
            project: new.project,
            user_id: new.user_id,
            mr_iid: new.mr_iid,
            issue_iid: new.issue_iid,
            commit_sha: new.commit_sha,
            conversation_id: new.conversation_id,
            intent: new.intent,
            question: new.question,
            strategy: None,
            comment_id: None,
            pipeline_id: None,
            result: None,
            usage: None,
            cost: None,
            duration_seconds: None,
            error_reason: None,
            retry_count: 0,
            prompt_version: None,
            created_at: new.created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task type.
    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the dispatch priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the creation origin.
    #[must_use]
    pub const fn origin(&self) -> TaskOrigin {
        self.origin
    }

    /// Returns the owning project reference.
    #[must_use]
    pub const fn project(&self) -> ProjectRef {
        self.project
    }

    /// Returns the resolved internal user, when known.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the merge request context, when present.
    #[must_use]
    pub const fn mr_iid(&self) -> Option<MrIid> {
        self.mr_iid
    }

    /// Returns the issue context, when present.
    #[must_use]
    pub const fn issue_iid(&self) -> Option<IssueIid> {
        self.issue_iid
    }

    /// Returns the commit SHA the work refers to, when known.
    #[must_use]
    pub fn commit_sha(&self) -> Option<&str> {
        self.commit_sha.as_deref()
    }

    /// Returns the originating conversation, when present.
    #[must_use]
    pub const fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }

    /// Returns the classified intent that produced the task.
    #[must_use]
    pub const fn intent(&self) -> Intent {
        self.intent
    }

    /// Returns the extracted question for ask-command tasks.
    #[must_use]
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    /// Returns the resolved review strategy, once dispatch chose one.
    #[must_use]
    pub const fn strategy(&self) -> Option<ReviewStrategy> {
        self.strategy
    }

    /// Returns the placeholder/summary note id, once posted.
    #[must_use]
    pub const fn comment_id(&self) -> Option<NoteId> {
        self.comment_id
    }

    /// Returns the triggered pipeline id, once recorded.
    #[must_use]
    pub const fn pipeline_id(&self) -> Option<PipelineId> {
        self.pipeline_id
    }

    /// Returns the processed result payload, when present.
    #[must_use]
    pub const fn result(&self) -> Option<&TaskResult> {
        self.result.as_ref()
    }

    /// Returns the executor token usage, when recorded.
    #[must_use]
    pub const fn usage(&self) -> Option<TokenUsage> {
        self.usage
    }

    /// Returns the total tokens used, when usage was recorded.
    #[must_use]
    pub fn tokens_used(&self) -> Option<u64> {
        self.usage.map(TokenUsage::total)
    }

    /// Returns the computed cost in dollars, when recorded.
    #[must_use]
    pub const fn cost(&self) -> Option<f64> {
        self.cost
    }

    /// Returns the executor wall-clock duration in seconds, when recorded.
    #[must_use]
    pub const fn duration_seconds(&self) -> Option<u64> {
        self.duration_seconds
    }

    /// Returns the failure reason, when the task failed.
    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        self.error_reason.as_deref()
    }

    /// Returns how many times the task was retried.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the prompt/schema provenance, when recorded.
    #[must_use]
    pub const fn prompt_version(&self) -> Option<&PromptVersion> {
        self.prompt_version.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task entered `Running`, if it has.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task entered `Completed`, if it has.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Transitions the task to a new status, stamping lifecycle
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the state
    /// machine forbids the move; the aggregate is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &dyn Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        match target {
            TaskStatus::Running => self.started_at = Some(clock.utc()),
            TaskStatus::Completed => self.completed_at = Some(clock.utc()),
            _ => {}
        }
        Ok(())
    }

    /// Transitions the task to `Failed` with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task
    /// is already terminal.
    pub fn fail(
        &mut self,
        reason: impl Into<String>,
        clock: &dyn Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Failed, clock)?;
        self.error_reason = Some(reason.into());
        Ok(())
    }

    /// Records the placeholder/summary note id.
    ///
    /// A comment id, once set, is never cleared — later reviews reuse it —
    /// so a second call with a different id is ignored.
    pub fn record_comment_id(&mut self, note_id: NoteId) {
        if self.comment_id.is_none() {
            self.comment_id = Some(note_id);
        }
    }

    /// Records the resolved review strategy.
    pub const fn record_strategy(&mut self, strategy: ReviewStrategy) {
        self.strategy = Some(strategy);
    }

    /// Records the merge request created for a feature-dev task. A merge
    /// request context, once set, is never replaced.
    pub fn record_mr_iid(&mut self, mr_iid: MrIid) {
        if self.mr_iid.is_none() {
            self.mr_iid = Some(mr_iid);
        }
    }

    /// Records the triggered pipeline id.
    pub const fn record_pipeline_id(&mut self, pipeline_id: PipelineId) {
        self.pipeline_id = Some(pipeline_id);
    }

    /// Stores the parsed result payload.
    pub fn record_result(&mut self, result: TaskResult) {
        self.result = Some(result);
    }

    /// Records executor accounting: token usage, computed cost, duration,
    /// and prompt provenance.
    pub fn record_accounting(
        &mut self,
        usage: TokenUsage,
        cost: f64,
        duration_seconds: u64,
        prompt_version: PromptVersion,
    ) {
        self.usage = Some(usage);
        self.cost = Some(cost);
        self.duration_seconds = Some(duration_seconds);
        self.prompt_version = Some(prompt_version);
    }
}
