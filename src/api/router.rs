//! Route assembly.

use axum::Router;
use axum::routing::post;

use super::state::AppState;
use super::{result, webhook};

/// Builds the application router over the shared state.
///
/// Both endpoints authenticate per request — the webhook by project
/// secret, the result callback by task token — so no middleware layer sits
/// in front of them.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook::handle))
        .route("/api/v1/tasks/{id}/result", post(result::handle))
        .with_state(state)
}
