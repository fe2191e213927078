//! Delivery deduplication and latest-wins supersession.

use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::task::domain::{TaskDomainError, TaskStatus};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::vcs::domain::MrIid;
use crate::webhook::domain::{RoutedEvent, WebhookEnvelope};
use crate::webhook::ports::{
    EventUuid, NewWebhookEventRecord, WebhookEventLog, WebhookEventLogError,
};

/// Why a delivery was rejected as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    /// The delivery uuid was already processed.
    DuplicateUuid,
}

impl DuplicateReason {
    /// Returns the wire representation used in webhook responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateUuid => "duplicate_uuid",
        }
    }
}

/// Outcome of running a delivery through the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// The delivery was seen before; processing stops idempotently.
    Duplicate(DuplicateReason),
    /// First sight; processing continues. Carries how many older tasks
    /// for the same merge request were superseded.
    Accepted {
        /// Number of tasks marked superseded.
        superseded_count: u32,
    },
}

/// Errors from deduplication.
#[derive(Debug, Error)]
pub enum EventDeduplicatorError {
    /// The delivery log failed.
    #[error(transparent)]
    EventLog(#[from] WebhookEventLogError),
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// A supersession transition was rejected.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
}

/// Rejects replayed deliveries and supersedes stale review tasks.
///
/// A delivery without a uuid header skips dedup entirely and is always
/// processed. Supersession runs only for events that carry new code state
/// (pushes, merge request open/update): every non-terminal task for the
/// same merge request moves to `Superseded`, preventing two concurrent
/// reviews racing to post comments. Two deliveries racing each other may
/// both miss the other's task; that window is accepted as best-effort.
#[derive(Clone)]
pub struct EventDeduplicator {
    event_log: Arc<dyn WebhookEventLog>,
    tasks: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
}

impl EventDeduplicator {
    /// Creates a deduplicator.
    #[must_use]
    pub fn new(
        event_log: Arc<dyn WebhookEventLog>,
        tasks: Arc<dyn TaskRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_log,
            tasks,
            clock,
        }
    }

    /// Runs a classified delivery through uuid dedup and supersession.
    ///
    /// `mr_iid` is the merge request context after push-branch resolution,
    /// so supersession covers pushes as well as direct MR events.
    ///
    /// # Errors
    ///
    /// Returns [`EventDeduplicatorError`] when the log or repository fail.
    pub async fn process(
        &self,
        event_uuid: Option<EventUuid>,
        envelope: &WebhookEnvelope,
        routed: &RoutedEvent,
        mr_iid: Option<MrIid>,
    ) -> Result<DedupOutcome, EventDeduplicatorError> {
        if let Some(uuid) = event_uuid {
            let first_sight = self
                .event_log
                .record(NewWebhookEventRecord {
                    event_uuid: uuid,
                    project_id: envelope.project.project_id,
                    event_kind: envelope.event.kind().as_str().to_owned(),
                    intent: Some(routed.intent),
                    received_at: self.clock.utc(),
                })
                .await?;
            if !first_sight {
                info!(
                    event_uuid = %uuid,
                    project_id = %envelope.project.project_id,
                    "rejecting duplicate delivery uuid"
                );
                return Ok(DedupOutcome::Duplicate(DuplicateReason::DuplicateUuid));
            }
        }

        let mut superseded_count = 0;
        if envelope.event.supersedes_older_reviews()
            && let Some(target_mr) = mr_iid
        {
            superseded_count = self.supersede_active_tasks(envelope, target_mr).await?;
        }

        Ok(DedupOutcome::Accepted { superseded_count })
    }

    /// Marks every queued/running task for the merge request superseded.
    async fn supersede_active_tasks(
        &self,
        envelope: &WebhookEnvelope,
        mr_iid: MrIid,
    ) -> Result<u32, EventDeduplicatorError> {
        let active = self
            .tasks
            .active_for_merge_request(envelope.project.project_id, mr_iid)
            .await?;

        let mut count = 0;
        for mut task in active {
            if let Err(err) = task.transition_to(TaskStatus::Superseded, &*self.clock) {
                // Lost the race against a concurrent terminal transition.
                warn!(task_id = %task.id(), error = %err, "skipping supersession");
                continue;
            }
            self.tasks.update(&task).await?;
            count += 1;
        }

        if count > 0 {
            info!(
                project_id = %envelope.project.project_id,
                mr_iid = %mr_iid,
                superseded_count = count,
                "superseded active tasks for merge request"
            );
        }
        Ok(count)
    }
}
