//! Shared fixtures for task lifecycle tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::queue::{Job, JobQueue, JobQueueResult};
use crate::task::domain::{Intent, NewTask, ProjectId, ProjectRef, TaskOrigin, TaskPriority};
use crate::vcs::domain::{GitlabProjectId, IssueIid, MrIid};

/// Clock pinned to a settable instant.
pub struct AdjustableClock {
    now: Mutex<DateTime<Utc>>,
}

impl AdjustableClock {
    /// Creates a clock pinned to the given instant.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }
}

impl Clock for AdjustableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Queue double that records enqueued jobs without running them.
#[derive(Default)]
pub struct RecordingJobQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingJobQueue {
    /// Creates an empty recording queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every job enqueued so far.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl JobQueue for RecordingJobQueue {
    async fn enqueue(&self, job: Job) -> JobQueueResult<()> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(job);
        Ok(())
    }
}

/// Project reference shared by the fixtures.
#[must_use]
pub const fn project() -> ProjectRef {
    ProjectRef::new(ProjectId::new(1), GitlabProjectId::new(42))
}

/// Creation parameters for a webhook-born code review task.
#[must_use]
pub fn review_task(mr_iid: u64, created_at: DateTime<Utc>) -> NewTask {
    NewTask {
        task_type: crate::task::domain::TaskType::CodeReview,
        priority: TaskPriority::Normal,
        origin: TaskOrigin::Webhook,
        project: project(),
        user_id: None,
        mr_iid: Some(MrIid::new(mr_iid)),
        issue_iid: None,
        commit_sha: None,
        conversation_id: None,
        intent: Intent::AutoReview,
        question: None,
        created_at,
    }
}

/// Creation parameters for an ask-command task on an issue.
#[must_use]
pub fn ask_task(issue_iid: u64, created_at: DateTime<Utc>) -> NewTask {
    NewTask {
        task_type: crate::task::domain::TaskType::IssueDiscussion,
        priority: TaskPriority::Normal,
        origin: TaskOrigin::Webhook,
        project: project(),
        user_id: None,
        mr_iid: None,
        issue_iid: Some(IssueIid::new(issue_iid)),
        commit_sha: None,
        conversation_id: None,
        intent: Intent::AskCommand,
        question: Some("What does this change?".to_owned()),
        created_at,
    }
}

/// A sample timestamp for deterministic fixtures.
#[must_use]
pub fn sample_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_default()
}
