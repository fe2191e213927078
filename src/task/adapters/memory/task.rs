//! In-memory task repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::domain::{NewTask, ProjectId, Task, TaskId, TaskStatus, TaskType};
use crate::task::ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};
use crate::vcs::domain::{MrIid, NoteId};

/// Thread-safe in-memory task repository with sequential id allocation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    next_id: u64,
    tasks: HashMap<TaskId, Task>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error<T>(err: &std::sync::PoisonError<T>) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Tasks for a merge request, sorted by ascending id.
fn tasks_for_merge_request(
    state: &InMemoryTaskState,
    project_id: ProjectId,
    mr_iid: MrIid,
) -> Vec<Task> {
    let mut tasks: Vec<Task> = state
        .tasks
        .values()
        .filter(|task| {
            task.project().project_id == project_id && task.mr_iid() == Some(mr_iid)
        })
        .cloned()
        .collect();
    tasks.sort_by_key(Task::id);
    tasks
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, new_task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.next_id += 1;
        let task = Task::from_new(TaskId::new(state.next_id), new_task);
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if !state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn active_for_merge_request(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks_for_merge_request(&state, project_id, mr_iid)
            .into_iter()
            .filter(|task| !task.status().is_terminal())
            .collect())
    }

    async fn previous_review_comment_id(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
        before: TaskId,
    ) -> TaskRepositoryResult<Option<NoteId>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks_for_merge_request(&state, project_id, mr_iid)
            .into_iter()
            .rev()
            .filter(|task| {
                task.task_type() == TaskType::CodeReview && task.id() < before
            })
            .find_map(|task| task.comment_id()))
    }

    async fn completed_reviews_for_merge_request(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks_for_merge_request(&state, project_id, mr_iid)
            .into_iter()
            .filter(|task| {
                task.task_type() == TaskType::CodeReview
                    && task.status() == TaskStatus::Completed
            })
            .collect())
    }

    async fn completed_review_shares_comment(
        &self,
        project_id: ProjectId,
        mr_iid: MrIid,
        comment_id: NoteId,
        excluding: TaskId,
    ) -> TaskRepositoryResult<bool> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks_for_merge_request(&state, project_id, mr_iid)
            .iter()
            .any(|task| {
                task.id() != excluding
                    && task.task_type() == TaskType::CodeReview
                    && task.status() == TaskStatus::Completed
                    && task.comment_id() == Some(comment_id)
            }))
    }
}
