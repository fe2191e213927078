//! Shared fixtures for webhook intake tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::queue::{Job, JobQueue, JobQueueResult};
use crate::task::domain::{ProjectId, ProjectRef};
use crate::vcs::domain::{ActorId, GitlabProjectId, MrIid};
use crate::webhook::domain::{MergeRequestAction, WebhookEnvelope, WebhookEvent};
use crate::webhook::ports::EventUuid;

/// Project reference shared by the fixtures.
pub const PROJECT: ProjectRef =
    ProjectRef::new(ProjectId::new(1), GitlabProjectId::new(42));

/// Clock pinned to a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Returns a fixed-instant clock.
#[must_use]
pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_default(),
    ))
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

/// Creation parameters for a webhook-born review task on the fixture
/// project.
#[must_use]
pub fn new_review_task(mr_iid: u64) -> crate::task::domain::NewTask {
    crate::task::domain::NewTask {
        task_type: crate::task::domain::TaskType::CodeReview,
        priority: crate::task::domain::TaskPriority::Normal,
        origin: crate::task::domain::TaskOrigin::Webhook,
        project: PROJECT,
        user_id: None,
        mr_iid: Some(MrIid::new(mr_iid)),
        issue_iid: None,
        commit_sha: None,
        conversation_id: None,
        intent: crate::task::domain::Intent::AutoReview,
        question: None,
        created_at: DateTime::parse_from_rfc3339("2025-06-01T11:00:00Z")
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_default(),
    }
}

/// A deterministic delivery uuid derived from a small seed.
#[must_use]
pub fn event_uuid(seed: u128) -> EventUuid {
    EventUuid::new(Uuid::from_u128(seed))
}

/// Envelope for a merge request open event.
#[must_use]
pub fn mr_open_envelope(mr_iid: u64, author: u64) -> WebhookEnvelope {
    WebhookEnvelope {
        project: PROJECT,
        event: WebhookEvent::MergeRequest {
            action: MergeRequestAction::Open,
            mr_iid: MrIid::new(mr_iid),
            source_branch: format!("feature/branch-{mr_iid}"),
            author: ActorId::new(author),
            last_commit_sha: Some("abc123".to_owned()),
        },
    }
}

/// Envelope for a note posted on a merge request.
#[must_use]
pub fn mr_note_envelope(mr_iid: u64, author: u64, note: &str) -> WebhookEnvelope {
    WebhookEnvelope {
        project: PROJECT,
        event: WebhookEvent::NoteOnMergeRequest {
            mr_iid: MrIid::new(mr_iid),
            note: note.to_owned(),
            author: ActorId::new(author),
        },
    }
}

/// Envelope for a push to a branch.
#[must_use]
pub fn push_envelope(branch: &str, pusher: u64) -> WebhookEnvelope {
    WebhookEnvelope {
        project: PROJECT,
        event: WebhookEvent::Push {
            branch: branch.to_owned(),
            before_sha: "before".to_owned(),
            after_sha: "after".to_owned(),
            pusher: ActorId::new(pusher),
        },
    }
}
