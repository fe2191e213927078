//! Shared application state for the HTTP handlers.

use std::sync::Arc;

use crate::config::ProjectRegistry;
use crate::task::ports::TaskRepository;
use crate::task::services::{ResultProcessor, TaskTokenService};
use crate::webhook::services::WebhookIntake;

/// Everything the handlers need, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Resolves webhook secrets to projects.
    pub registry: Arc<dyn ProjectRegistry>,
    /// Webhook intake orchestration.
    pub intake: Arc<WebhookIntake>,
    /// Task token verification for the result endpoint.
    pub tokens: TaskTokenService,
    /// Task lookup for the result endpoint.
    pub tasks: Arc<dyn TaskRepository>,
    /// Result validation and reconciliation fan-out.
    pub processor: ResultProcessor,
}
