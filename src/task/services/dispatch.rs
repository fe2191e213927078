//! Creation and enqueueing of tasks from classified webhook events.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{PermissionGate, PermissionGateError};
use crate::queue::{Job, JobQueue, JobQueueError};
use crate::task::domain::{
    Intent, NewTask, ProjectRef, Task, TaskOrigin, TaskPriority,
};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::vcs::domain::{ActorId, IssueIid, MrIid};

/// Parameter object for dispatching a classified event as a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Project the event was delivered for.
    pub project: ProjectRef,
    /// Classified intent.
    pub intent: Intent,
    /// Dispatch priority.
    pub priority: TaskPriority,
    /// Creation origin.
    pub origin: TaskOrigin,
    /// Acting GitLab user, when the event carries one.
    pub actor: Option<ActorId>,
    /// Merge request context, when applicable.
    pub mr_iid: Option<MrIid>,
    /// Issue context, when applicable.
    pub issue_iid: Option<IssueIid>,
    /// Commit SHA the work refers to, when known.
    pub commit_sha: Option<String>,
    /// Extracted question for ask-command tasks.
    pub question: Option<String>,
}

/// Errors from task dispatch.
#[derive(Debug, Error)]
pub enum TaskDispatchError {
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The permission collaborator failed.
    #[error(transparent)]
    Permissions(#[from] PermissionGateError),
    /// The job queue rejected the dispatch job.
    #[error(transparent)]
    Queue(#[from] JobQueueError),
}

/// Creates the task row for a routed event and enqueues its dispatch.
///
/// The actor is resolved to an internal user when possible but an
/// unresolved actor does not block dispatch — ungated intents (automatic
/// reviews) legitimately fire for unknown users.
#[derive(Clone)]
pub struct TaskDispatchService {
    tasks: Arc<dyn TaskRepository>,
    gate: Arc<dyn PermissionGate>,
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl TaskDispatchService {
    /// Creates a dispatch service.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        gate: Arc<dyn PermissionGate>,
        queue: Arc<dyn JobQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tasks,
            gate,
            queue,
            clock,
        }
    }

    /// Creates a queued task for the request and enqueues its dispatch.
    ///
    /// Returns `None` for intents that never dispatch a task (help
    /// responses, acceptance tracking).
    ///
    /// # Errors
    ///
    /// Returns [`TaskDispatchError`] when persistence, permission lookup,
    /// or enqueueing fail.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<Option<Task>, TaskDispatchError> {
        let Some(task_type) = request.intent.task_type() else {
            debug!(intent = %request.intent, "non-dispatchable intent, skipping");
            return Ok(None);
        };

        let user_id = match request.actor {
            Some(actor) => self.gate.resolve_user(actor).await?,
            None => None,
        };

        let task = self
            .tasks
            .create(NewTask {
                task_type,
                priority: request.priority,
                origin: request.origin,
                project: request.project,
                user_id,
                mr_iid: request.mr_iid,
                issue_iid: request.issue_iid,
                commit_sha: request.commit_sha,
                conversation_id: None,
                intent: request.intent,
                question: request.question,
                created_at: self.clock.utc(),
            })
            .await?;

        self.queue.enqueue(Job::ProcessTask(task.id())).await?;

        info!(
            task_id = %task.id(),
            task_type = %task_type,
            intent = %request.intent,
            priority = request.priority.as_str(),
            "dispatched task"
        );
        Ok(Some(task))
    }
}
