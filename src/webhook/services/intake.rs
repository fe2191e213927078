//! Webhook intake orchestration.
//!
//! The single path every delivery takes: classify, gate on permissions,
//! deduplicate, then dispatch a task and/or background jobs. Validation
//! and persistence happen before the HTTP response; everything that talks
//! to GitLab afterwards rides the job queue.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::classifier::EventClassifier;
use super::dedup::{DedupOutcome, EventDeduplicator, EventDeduplicatorError};
use crate::config::{Capability, PermissionGate, PermissionGateError};
use crate::queue::{Job, JobQueue, JobQueueError};
use crate::task::domain::{Intent, ProjectId, TaskId, TaskOrigin};
use crate::task::services::{DispatchRequest, TaskDispatchError, TaskDispatchService};
use crate::vcs::domain::MrIid;
use crate::vcs::ports::VcsClient;
use crate::webhook::domain::{EventKind, WebhookEnvelope, WebhookEvent};
use crate::webhook::ports::EventUuid;

/// Overall verdict of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookStatus {
    /// The delivery was processed (possibly without an intent).
    Accepted,
    /// The delivery was replayed and ignored idempotently.
    Duplicate,
}

impl WebhookStatus {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Duplicate => "duplicate",
        }
    }
}

/// What intake did with a delivery; the HTTP layer serializes this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    /// Overall verdict.
    pub status: WebhookStatus,
    /// Parsed event kind.
    pub event_kind: EventKind,
    /// Project the delivery was for.
    pub project_id: ProjectId,
    /// Classified intent, when any.
    pub intent: Option<Intent>,
    /// Dispatched task, when any.
    pub task_id: Option<TaskId>,
    /// Set when a gated intent was dropped for lack of permission.
    pub permission_denied: bool,
    /// Tasks superseded by this delivery, when dedup ran.
    pub superseded_count: Option<u32>,
    /// Duplicate reason, for replayed deliveries.
    pub reason: Option<String>,
}

impl WebhookOutcome {
    fn accepted(event_kind: EventKind, project_id: ProjectId) -> Self {
        Self {
            status: WebhookStatus::Accepted,
            event_kind,
            project_id,
            intent: None,
            task_id: None,
            permission_denied: false,
            superseded_count: None,
            reason: None,
        }
    }
}

/// Errors from intake orchestration.
#[derive(Debug, Error)]
pub enum WebhookIntakeError {
    /// Deduplication failed.
    #[error(transparent)]
    Dedup(#[from] EventDeduplicatorError),
    /// The permission collaborator failed.
    #[error(transparent)]
    Permissions(#[from] PermissionGateError),
    /// Task dispatch failed.
    #[error(transparent)]
    Dispatch(#[from] TaskDispatchError),
    /// A background job could not be enqueued.
    #[error(transparent)]
    Queue(#[from] JobQueueError),
}

/// Orchestrates one webhook delivery end to end.
#[derive(Clone)]
pub struct WebhookIntake {
    classifier: EventClassifier,
    dedup: EventDeduplicator,
    gate: Arc<dyn PermissionGate>,
    dispatch: TaskDispatchService,
    vcs: Arc<dyn VcsClient>,
    queue: Arc<dyn JobQueue>,
}

impl WebhookIntake {
    /// Creates an intake service.
    #[must_use]
    pub fn new(
        classifier: EventClassifier,
        dedup: EventDeduplicator,
        gate: Arc<dyn PermissionGate>,
        dispatch: TaskDispatchService,
        vcs: Arc<dyn VcsClient>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            classifier,
            dedup,
            gate,
            dispatch,
            vcs,
            queue,
        }
    }

    /// Processes one parsed delivery.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookIntakeError`] when a collaborator fails;
    /// classification misses, permission denials, and duplicates are
    /// outcomes, not errors.
    pub async fn handle(
        &self,
        envelope: WebhookEnvelope,
        event_uuid: Option<EventUuid>,
    ) -> Result<WebhookOutcome, WebhookIntakeError> {
        let event_kind = envelope.event.kind();
        let project_id = envelope.project.project_id;
        let mut outcome = WebhookOutcome::accepted(event_kind, project_id);

        let Some(routed) = self.classifier.classify(&envelope.event) else {
            return Ok(outcome);
        };
        outcome.intent = Some(routed.intent);

        // Pushes only become reviews when an open MR exists for the branch.
        let mut mr_iid = envelope.event.mr_iid();
        let mut push_range = None;
        if let WebhookEvent::Push {
            branch,
            before_sha,
            after_sha,
            ..
        } = &envelope.event
        {
            match self
                .vcs
                .find_open_mr_for_branch(envelope.project.gitlab_project_id, branch)
                .await
            {
                Ok(Some(mr)) => {
                    mr_iid = Some(mr.iid);
                    push_range = Some((before_sha.clone(), after_sha.clone()));
                }
                Ok(None) => {
                    info!(branch = branch.as_str(), "push without open MR, ignoring");
                    outcome.intent = None;
                    return Ok(outcome);
                }
                Err(err) => {
                    warn!(branch = branch.as_str(), error = %err, "failed to resolve MR for pushed branch");
                    outcome.intent = None;
                    return Ok(outcome);
                }
            }
        }

        if routed.intent.requires_trigger_permission()
            && !self.is_authorized(&envelope, routed.intent).await?
        {
            outcome.permission_denied = true;
            return Ok(outcome);
        }

        match self
            .dedup
            .process(event_uuid, &envelope, &routed, mr_iid)
            .await?
        {
            DedupOutcome::Duplicate(reason) => {
                outcome.status = WebhookStatus::Duplicate;
                outcome.reason = Some(reason.as_str().to_owned());
                return Ok(outcome);
            }
            DedupOutcome::Accepted { superseded_count } => {
                outcome.superseded_count = Some(superseded_count);
            }
        }

        match routed.intent {
            Intent::AcceptanceTracking => {
                if let Some(merged_mr) = mr_iid {
                    self.queue
                        .enqueue(Job::TrackAcceptance {
                            project: envelope.project,
                            mr_iid: merged_mr,
                        })
                        .await?;
                }
                return Ok(outcome);
            }
            Intent::HelpResponse => {
                self.enqueue_help_response(&envelope, mr_iid, routed.unrecognized_command.clone())
                    .await?;
                return Ok(outcome);
            }
            _ => {}
        }

        let task = self
            .dispatch
            .dispatch(DispatchRequest {
                project: envelope.project,
                intent: routed.intent,
                priority: routed.priority,
                origin: TaskOrigin::Webhook,
                actor: Some(envelope.event.actor()),
                mr_iid,
                issue_iid: envelope.event.issue_iid(),
                commit_sha: envelope.event.commit_sha().map(str::to_owned),
                question: routed.question.clone(),
            })
            .await?;
        outcome.task_id = task.map(|task| task.id());

        // Pushes additionally feed code-change correlation.
        if let (Some((before_sha, after_sha)), Some(push_mr)) = (push_range, mr_iid) {
            self.queue
                .enqueue(Job::CorrelateCodeChange {
                    project: envelope.project,
                    mr_iid: push_mr,
                    before_sha,
                    after_sha,
                })
                .await?;
        }

        Ok(outcome)
    }

    /// A gated intent proceeds only when the actor maps to a known user
    /// holding `review.trigger` on the project.
    async fn is_authorized(
        &self,
        envelope: &WebhookEnvelope,
        intent: Intent,
    ) -> Result<bool, WebhookIntakeError> {
        let actor = envelope.event.actor();
        let Some(user_id) = self.gate.resolve_user(actor).await? else {
            info!(
                intent = %intent,
                actor = %actor,
                "permission check: actor has no account, dropping"
            );
            return Ok(false);
        };
        let authorized = self
            .gate
            .authorize(
                user_id,
                Capability::ReviewTrigger,
                envelope.project.project_id,
            )
            .await?;
        if !authorized {
            info!(
                intent = %intent,
                user_id = %user_id,
                "permission check: user lacks review.trigger, dropping"
            );
        }
        Ok(authorized)
    }

    async fn enqueue_help_response(
        &self,
        envelope: &WebhookEnvelope,
        mr_iid: Option<MrIid>,
        command: Option<String>,
    ) -> Result<(), WebhookIntakeError> {
        let Some(target_mr) = mr_iid else {
            return Ok(());
        };
        self.queue
            .enqueue(Job::PostHelpResponse {
                project: envelope.project,
                mr_iid: target_mr,
                command: command.unwrap_or_else(|| "@ai".to_owned()),
            })
            .await?;
        Ok(())
    }
}
