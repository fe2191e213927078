//! Port contracts for webhook intake.

pub mod event_log;

pub use event_log::{
    EventUuid, NewWebhookEventRecord, WebhookEventLog, WebhookEventLogError,
    WebhookEventLogResult,
};
