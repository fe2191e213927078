//! Webhook intake services: classification, deduplication, orchestration.

mod classifier;
mod dedup;
mod intake;

pub use classifier::EventClassifier;
pub use dedup::{DedupOutcome, DuplicateReason, EventDeduplicator, EventDeduplicatorError};
pub use intake::{WebhookIntake, WebhookIntakeError, WebhookOutcome, WebhookStatus};
