//! Shared wiring for HTTP-level integration tests.
//!
//! Builds the full application over in-memory adapters with the inline
//! job queue, so a webhook delivery runs dispatch synchronously and a
//! result submission runs reconciliation before the response returns.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use tower::ServiceExt;

use vunnix::api::{AppState, router};
use vunnix::config::{
    AppConfig, Capability, InMemoryAcceptanceSink, InMemoryConfigResolver, InMemoryPermissionGate,
    InMemoryProjectRegistry,
};
use vunnix::queue::{InlineJobQueue, JobRunner};
use vunnix::reconcile::services::{
    AcceptanceTracker, AnswerPoster, FeatureDevPoster, HelpResponsePoster, LabelStatusPoster,
    SummaryPoster, ThreadPoster,
};
use vunnix::task::adapters::memory::InMemoryTaskRepository;
use vunnix::task::domain::{ProjectId, ProjectRef, UserId};
use vunnix::task::services::{
    CostCalculator, ResultProcessor, TaskDispatchService, TaskDispatcher, TaskTokenService,
};
use vunnix::vcs::adapters::InMemoryVcsClient;
use vunnix::vcs::domain::{ActorId, DiffRefs, GitlabProjectId, MergeRequestInfo, MrIid};
use vunnix::webhook::adapters::InMemoryWebhookEventLog;
use vunnix::webhook::services::{EventClassifier, EventDeduplicator, WebhookIntake};

/// Webhook secret registered for the fixture project.
pub const WEBHOOK_SECRET: &str = "hook-secret";
/// Fixture project (internal id 1, GitLab id 42).
pub const PROJECT: ProjectRef = ProjectRef::new(ProjectId::new(1), GitlabProjectId::new(42));
/// GitLab account id of the bot.
pub const BOT_ACCOUNT: ActorId = ActorId::new(999);
/// A human reviewer with the trigger capability (see [`TestApp::new`]).
pub const REVIEWER: ActorId = ActorId::new(5);

/// Clock the whole application reads; settable from tests.
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(
                DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
                    .map(|at| at.with_timezone(&Utc))
                    .unwrap_or_default(),
            ),
        }
    }

    /// Moves the clock forward by whole minutes.
    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += chrono::Duration::minutes(minutes);
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// The wired application plus handles onto its fakes.
pub struct TestApp {
    pub router: Router,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub vcs: Arc<InMemoryVcsClient>,
    pub gate: Arc<InMemoryPermissionGate>,
    pub clock: Arc<TestClock>,
}

impl TestApp {
    /// Wires the application: project registered under
    /// [`WEBHOOK_SECRET`], CI trigger token configured, [`REVIEWER`]
    /// granted the review-trigger capability.
    pub fn new() -> Self {
        let config = AppConfig::new("integration-secret").with_bot_account(BOT_ACCOUNT);
        let clock = Arc::new(TestClock::new());
        let vcs = Arc::new(InMemoryVcsClient::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let event_log = Arc::new(InMemoryWebhookEventLog::new());
        let registry = Arc::new(InMemoryProjectRegistry::new());
        registry.register(WEBHOOK_SECRET, PROJECT);
        let gate = Arc::new(InMemoryPermissionGate::new());
        gate.register_user(REVIEWER, UserId::new(77));
        gate.grant(UserId::new(77), Capability::ReviewTrigger, PROJECT.project_id);
        let resolver = Arc::new(InMemoryConfigResolver::new());
        resolver.insert(PROJECT.project_id, "ci_trigger_token", json!("glptt-123"));

        let tokens = TaskTokenService::new(
            &config.app_secret,
            config.token_budget_minutes,
            clock.clone(),
        );
        let dispatcher = TaskDispatcher::new(
            tasks.clone(),
            vcs.clone(),
            resolver,
            tokens.clone(),
            clock.clone(),
        );
        let runner = Arc::new(JobRunner::new(
            dispatcher,
            SummaryPoster::new(tasks.clone(), vcs.clone(), clock.clone()),
            ThreadPoster::new(tasks.clone(), vcs.clone()),
            LabelStatusPoster::new(tasks.clone(), vcs.clone(), config.commit_status_name.clone()),
            AnswerPoster::new(tasks.clone(), vcs.clone()),
            FeatureDevPoster::new(tasks.clone(), vcs.clone()),
            HelpResponsePoster::new(vcs.clone()),
            AcceptanceTracker::new(tasks.clone(), vcs.clone(), Arc::new(InMemoryAcceptanceSink::new())),
        ));
        let queue = Arc::new(InlineJobQueue::new(runner));

        let intake = Arc::new(WebhookIntake::new(
            EventClassifier::new(config.bot_account_id),
            EventDeduplicator::new(event_log, tasks.clone(), clock.clone()),
            gate.clone(),
            TaskDispatchService::new(tasks.clone(), gate.clone(), queue.clone(), clock.clone()),
            vcs.clone(),
            queue.clone(),
        ));
        let processor = ResultProcessor::new(
            tasks.clone(),
            queue,
            CostCalculator::new(config.pricing),
            clock.clone(),
        );

        let state = AppState {
            registry,
            intake,
            tokens,
            tasks: tasks.clone(),
            processor,
        };

        Self {
            router: router(state),
            tasks,
            vcs,
            gate,
            clock,
        }
    }

    /// Seeds an open merge request on the fixture project.
    pub fn seed_merge_request(&self, iid: u64, source_branch: &str, changed_paths: &[&str]) {
        self.vcs.insert_merge_request(
            PROJECT.gitlab_project_id,
            MergeRequestInfo {
                iid: MrIid::new(iid),
                source_branch: source_branch.to_owned(),
                head_sha: format!("head-{iid}"),
                diff_refs: DiffRefs {
                    base_sha: "base".to_owned(),
                    start_sha: "start".to_owned(),
                    head_sha: format!("head-{iid}"),
                },
            },
        );
        self.vcs.set_changed_paths(
            PROJECT.gitlab_project_id,
            MrIid::new(iid),
            changed_paths.iter().map(|path| (*path).to_owned()).collect(),
        );
    }

    /// Delivers a webhook payload and returns (status, parsed body).
    pub async fn deliver_webhook(
        &self,
        event_header: Option<&str>,
        secret: Option<&str>,
        event_uuid: Option<&str>,
        payload: &Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(event) = event_header {
            request = request.header("X-Gitlab-Event", event);
        }
        if let Some(token) = secret {
            request = request.header("X-Gitlab-Token", token);
        }
        if let Some(uuid) = event_uuid {
            request = request.header("X-Gitlab-Event-UUID", uuid);
        }
        let request = request
            .body(Body::from(payload.to_string()))
            .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        split_response(response).await
    }

    /// Submits a result callback and returns (status, parsed body).
    pub async fn submit_result(
        &self,
        task_id: u64,
        bearer: Option<&str>,
        payload: &Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/tasks/{task_id}/result"))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = request
            .body(Body::from(payload.to_string()))
            .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router responds");
        split_response(response).await
    }

    /// Returns the `VUNNIX_TOKEN` variable of the most recently triggered
    /// pipeline.
    pub fn last_pipeline_token(&self) -> String {
        let pipelines = self.vcs.triggered_pipelines();
        let last = pipelines.last().expect("a pipeline was triggered");
        last.request
            .variables
            .iter()
            .find(|(key, _)| key == "VUNNIX_TOKEN")
            .map(|(_, value)| value.clone())
            .expect("pipeline carries the task token")
    }
}

async fn split_response(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };
    (status, body)
}

/// GitLab payload for a merge request action.
pub fn mr_event_payload(action: &str, iid: u64, branch: &str, author: u64) -> Value {
    json!({
        "object_attributes": {
            "action": action,
            "iid": iid,
            "source_branch": branch,
            "author_id": author,
            "last_commit": {"id": format!("head-{iid}")}
        }
    })
}

/// GitLab payload for a note on a merge request.
pub fn mr_note_payload(iid: u64, author: u64, note: &str) -> Value {
    json!({
        "object_attributes": {
            "note": note,
            "author_id": author,
            "noteable_type": "MergeRequest"
        },
        "merge_request": {"iid": iid}
    })
}

/// GitLab payload for a push.
pub fn push_payload(branch: &str, user_id: u64) -> Value {
    json!({
        "ref": format!("refs/heads/{branch}"),
        "before": "before-sha",
        "after": "after-sha",
        "user_id": user_id
    })
}

/// A structurally valid completed review submission.
pub fn completed_review_submission(result: Value) -> Value {
    json!({
        "status": "completed",
        "result": result,
        "tokens": {"input": 150_000, "output": 30_000, "thinking": 5_000},
        "duration_seconds": 120,
        "prompt_version": {"skill": "v3", "claude_md": "v1", "schema": "v2"}
    })
}

/// A review result payload with the given findings.
pub fn review_result_payload(risk_level: &str, findings: &[Value]) -> Value {
    json!({
        "summary": {
            "risk_level": risk_level,
            "total_findings": findings.len(),
            "walkthrough": [{"file": "app/Models/User.php", "change_summary": "Reworked auth"}]
        },
        "findings": findings
    })
}

/// A finding payload at the given coordinates.
pub fn finding_payload(id: u32, severity: &str, category: &str, file: &str, line: u32, title: &str) -> Value {
    json!({
        "id": id,
        "severity": severity,
        "category": category,
        "file": file,
        "line": line,
        "title": title,
        "description": format!("Details for {title}.")
    })
}
