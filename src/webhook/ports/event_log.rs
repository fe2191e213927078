//! Webhook delivery log port: the uuid-keyed dedup record.

use crate::task::domain::{Intent, ProjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// The delivery uuid GitLab sends in `X-Gitlab-Event-UUID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventUuid(Uuid);

impl EventUuid {
    /// Parses the header value; malformed values disable dedup for the
    /// delivery rather than rejecting it.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    /// Wraps an already-parsed uuid.
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped uuid.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for EventUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result type for event log operations.
pub type WebhookEventLogResult<T> = Result<T, WebhookEventLogError>;

/// Audit fields stored with each first-seen delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWebhookEventRecord {
    /// Delivery uuid.
    pub event_uuid: EventUuid,
    /// Project the delivery belongs to.
    pub project_id: ProjectId,
    /// Internal event kind name.
    pub event_kind: String,
    /// Classified intent, when one was produced.
    pub intent: Option<Intent>,
    /// When the delivery was received.
    pub received_at: DateTime<Utc>,
}

/// Insert-only log of processed webhook deliveries.
#[async_trait]
pub trait WebhookEventLog: Send + Sync {
    /// Records a delivery uuid atomically.
    ///
    /// Returns `true` on first sight and `false` when the uuid was already
    /// recorded — including the race where a concurrent delivery inserted
    /// it between the caller's check and this insert.
    async fn record(&self, record: NewWebhookEventRecord) -> WebhookEventLogResult<bool>;
}

/// Errors returned by event log implementations.
#[derive(Debug, Clone, Error)]
#[error("webhook event log failure: {0}")]
pub struct WebhookEventLogError(pub Arc<dyn std::error::Error + Send + Sync>);

impl WebhookEventLogError {
    /// Wraps a persistence failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
