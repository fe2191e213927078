//! `POST /webhook` — GitLab webhook intake.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::error::ApiError;
use super::state::AppState;
use crate::webhook::domain::{EventKind, WebhookEnvelope, WebhookEvent};
use crate::webhook::ports::EventUuid;
use crate::webhook::services::WebhookOutcome;

/// Handles one webhook delivery.
///
/// # Errors
///
/// Returns [`ApiError`] for unknown webhook secrets and internal
/// collaborator failures; everything else is a structured 2xx/400 body.
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Response, ApiError> {
    let Some(event_header) = header_value(&headers, "X-Gitlab-Event") else {
        warn!("webhook request missing X-Gitlab-Event header");
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "ignored",
                "reason": "Missing X-Gitlab-Event header.",
            })),
        )
            .into_response());
    };

    let secret = header_value(&headers, "X-Gitlab-Token").unwrap_or_default();
    let Some(project) = state
        .registry
        .resolve_webhook_secret(&secret)
        .await
        .map_err(ApiError::internal)?
    else {
        return Err(ApiError::Unauthorized("Invalid webhook token.".to_owned()));
    };

    let Some(kind) = EventKind::from_header(&event_header) else {
        info!(gitlab_event = event_header.as_str(), "unsupported event type");
        return Ok(Json(json!({
            "status": "ignored",
            "reason": format!("Unsupported event type: {event_header}"),
        }))
        .into_response());
    };

    let event_uuid =
        header_value(&headers, "X-Gitlab-Event-UUID").and_then(|raw| EventUuid::parse(&raw));

    info!(
        project_id = %project.project_id,
        event_type = kind.as_str(),
        event_uuid = ?event_uuid,
        "webhook event received"
    );

    let Some(event) = WebhookEvent::from_payload(kind, &payload) else {
        return Ok(Json(json!({
            "status": "accepted",
            "event_type": kind.as_str(),
            "project_id": project.project_id,
            "intent": Value::Null,
        }))
        .into_response());
    };

    let outcome = state
        .intake
        .handle(WebhookEnvelope { project, event }, event_uuid)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(outcome_body(&outcome)).into_response())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn outcome_body(outcome: &WebhookOutcome) -> Value {
    let mut body = json!({
        "status": outcome.status.as_str(),
        "event_type": outcome.event_kind.as_str(),
        "project_id": outcome.project_id,
        "intent": outcome.intent.map(|intent| intent.as_str()),
    });
    if let Some(object) = body.as_object_mut() {
        if let Some(task_id) = outcome.task_id {
            object.insert("task_id".to_owned(), json!(task_id));
        }
        if outcome.permission_denied {
            object.insert("permission_denied".to_owned(), json!(true));
        }
        if let Some(count) = outcome.superseded_count {
            object.insert("superseded_count".to_owned(), json!(count));
        }
        if let Some(reason) = &outcome.reason {
            object.insert("reason".to_owned(), json!(reason));
        }
    }
    body
}
