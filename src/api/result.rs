//! `POST /api/v1/tasks/{id}/result` — executor result submission.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde_json::{Value, json};
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::task::domain::{TaskId, TaskStatus};
use crate::task::services::ResultSubmission;

/// Handles one result callback from the external executor.
///
/// Checks run in order: bearer token present, token valid for the
/// addressed task, task exists, task running, payload structurally valid.
/// Only then does the processor take over; its reconciliation fan-out is
/// fire-and-forget from the executor's perspective, so a completed
/// submission answers `processing` immediately.
///
/// # Errors
///
/// Returns [`ApiError`] for every failed check: 401 missing/invalid
/// token, 404 unknown task, 409 wrong lifecycle state, 422 per-field
/// validation failures.
pub async fn handle(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let task_id = TaskId::new(id);

    let Some(bearer) = bearer_token(&headers) else {
        return Err(ApiError::Unauthorized("Missing task token".to_owned()));
    };
    if !state.tokens.validate(&bearer, task_id) {
        return Err(ApiError::Unauthorized(
            "Invalid or expired task token".to_owned(),
        ));
    }

    let task = state
        .tasks
        .find_by_id(task_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("Task {task_id} not found")))?;

    if task.status() != TaskStatus::Running {
        return Err(ApiError::Conflict(format!(
            "Task {task_id} is not awaiting a result (current state: {})",
            task.status()
        )));
    }

    let submission = ResultSubmission::validate(&payload).map_err(ApiError::Validation)?;

    let outcome = state
        .processor
        .process(task, submission)
        .await
        .map_err(ApiError::internal)?;

    info!(task_id = %task_id, task_status = outcome.as_str(), "result submission accepted");

    Ok(Json(json!({
        "status": "accepted",
        "task_id": task_id,
        "task_status": wire_status(outcome),
    })))
}

/// Completed submissions report `processing`: the task is done but its
/// reconciliation artifacts are still being posted.
const fn wire_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "processing",
        other => other.as_str(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}
