//! Repository port for task persistence and cross-task lookup.

use crate::task::domain::{NewTask, ProjectId, Task, TaskId};
use crate::vcs::domain::{MrIid, NoteId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// The cross-task queries exist so incremental-review behavior stays
/// reproducible under concurrent dispatch: "find the prior review's
/// comment" is an explicit repository question, never in-memory state
/// carried between tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task, allocating its identifier.
    async fn create(&self, new_task: NewTask) -> TaskRepositoryResult<Task>;

    /// Persists changes to an existing task (status, correlation ids,
    /// result, accounting).
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier. Returns `None` when absent.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns all non-terminal (queued or running) tasks for a merge
    /// request.
    async fn active_for_merge_request(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the comment id of the most recent earlier code review task
    /// for the merge request, regardless of how that task ended.
    ///
    /// Reusing comments from failed and superseded reviews keeps one
    /// summary note per merge request instead of a trail of placeholders.
    async fn previous_review_comment_id(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
        before: TaskId,
    ) -> TaskRepositoryResult<Option<NoteId>>;

    /// Returns all completed code review tasks for a merge request, in
    /// ascending id order. Feeds acceptance correlation after a merge.
    async fn completed_reviews_for_merge_request(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns whether a *completed* code review task other than
    /// `excluding` shares the given comment id on the merge request.
    ///
    /// This is the incremental-review detector: a shared comment id on a
    /// completed predecessor means the summary is an update, not a first
    /// review.
    async fn completed_review_shares_comment(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
        comment_id: NoteId,
        excluding: TaskId,
    ) -> TaskRepositoryResult<bool>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
