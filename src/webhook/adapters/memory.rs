//! In-memory webhook delivery log.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::webhook::ports::{
    EventUuid, NewWebhookEventRecord, WebhookEventLog, WebhookEventLogError,
    WebhookEventLogResult,
};

/// Thread-safe in-memory delivery log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWebhookEventLog {
    records: Arc<RwLock<HashMap<EventUuid, NewWebhookEventRecord>>>,
}

impl InMemoryWebhookEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many distinct deliveries were recorded.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let records = self.records.read().expect("event log lock poisoned");
        records.len()
    }

    /// Returns whether no deliveries were recorded yet.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WebhookEventLog for InMemoryWebhookEventLog {
    async fn record(&self, record: NewWebhookEventRecord) -> WebhookEventLogResult<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|err| WebhookEventLogError::new(std::io::Error::other(err.to_string())))?;
        if records.contains_key(&record.event_uuid) {
            return Ok(false);
        }
        records.insert(record.event_uuid, record);
        Ok(true)
    }
}
