//! Vunnix HTTP server.
//!
//! Wires the webhook and result endpoints over the in-process adapters and
//! the GitLab REST client, then serves with axum. Configuration comes from
//! the environment:
//!
//! ```text
//! VUNNIX_APP_SECRET            task token signing secret (required)
//! VUNNIX_GITLAB_URL            GitLab base URL (required)
//! VUNNIX_GITLAB_TOKEN          bot account personal access token (required)
//! VUNNIX_BIND                  listen address, default 0.0.0.0:8080
//! VUNNIX_BOT_ACCOUNT_ID        numeric bot user id, filters self-notes
//! VUNNIX_TOKEN_BUDGET_MINUTES  task token validity window, default 60
//! VUNNIX_WEBHOOK_SECRET        webhook secret of the served project
//! VUNNIX_PROJECT_ID            internal id of the served project
//! VUNNIX_GITLAB_PROJECT_ID     GitLab id of the served project
//! VUNNIX_CI_TRIGGER_TOKEN      CI trigger token of the served project
//! ```
//!
//! Project administration is an external collaborator; the env-driven
//! single-project registration here stands in for it.

use std::env;
use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vunnix::api::{AppState, router};
use vunnix::config::{
    AppConfig, InMemoryAcceptanceSink, InMemoryConfigResolver, InMemoryPermissionGate,
    InMemoryProjectRegistry,
};
use vunnix::queue::{JobRunner, TokioJobQueue};
use vunnix::reconcile::services::{
    AcceptanceTracker, AnswerPoster, FeatureDevPoster, HelpResponsePoster, LabelStatusPoster,
    SummaryPoster, ThreadPoster,
};
use vunnix::task::adapters::memory::InMemoryTaskRepository;
use vunnix::task::domain::{ProjectId, ProjectRef};
use vunnix::task::services::{
    CostCalculator, ResultProcessor, TaskDispatchService, TaskDispatcher, TaskTokenService,
};
use vunnix::vcs::adapters::GitLabClient;
use vunnix::vcs::domain::{ActorId, GitlabProjectId};
use vunnix::webhook::adapters::InMemoryWebhookEventLog;
use vunnix::webhook::services::{EventClassifier, EventDeduplicator, WebhookIntake};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn required_env(key: &str) -> Result<String, BoxError> {
    env::var(key).map_err(|_| format!("{key} must be set").into())
}

fn load_config() -> Result<AppConfig, BoxError> {
    let mut config = AppConfig::new(required_env("VUNNIX_APP_SECRET")?);
    if let Ok(minutes) = env::var("VUNNIX_TOKEN_BUDGET_MINUTES") {
        config = config.with_token_budget_minutes(minutes.parse()?);
    }
    if let Ok(bot_id) = env::var("VUNNIX_BOT_ACCOUNT_ID") {
        config = config.with_bot_account(ActorId::new(bot_id.parse()?));
    }
    Ok(config)
}

fn register_project_from_env(
    registry: &InMemoryProjectRegistry,
    resolver: &InMemoryConfigResolver,
) -> Result<(), BoxError> {
    let Ok(secret) = env::var("VUNNIX_WEBHOOK_SECRET") else {
        return Ok(());
    };
    let project_id = ProjectId::new(required_env("VUNNIX_PROJECT_ID")?.parse()?);
    let gitlab_id = GitlabProjectId::new(required_env("VUNNIX_GITLAB_PROJECT_ID")?.parse()?);
    registry.register(secret, ProjectRef::new(project_id, gitlab_id));
    if let Ok(trigger_token) = env::var("VUNNIX_CI_TRIGGER_TOKEN") {
        resolver.insert(project_id, "ci_trigger_token", trigger_token.into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let gitlab_url = required_env("VUNNIX_GITLAB_URL")?;
    let gitlab_token = required_env("VUNNIX_GITLAB_TOKEN")?;
    let bind = env::var("VUNNIX_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    let clock = Arc::new(DefaultClock);
    let vcs = Arc::new(GitLabClient::new(gitlab_url, gitlab_token));
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let event_log = Arc::new(InMemoryWebhookEventLog::new());
    let registry = Arc::new(InMemoryProjectRegistry::new());
    let gate = Arc::new(InMemoryPermissionGate::new());
    let resolver = Arc::new(InMemoryConfigResolver::new());
    let sink = Arc::new(InMemoryAcceptanceSink::new());
    register_project_from_env(&registry, &resolver)?;

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
        AcceptanceTracker::new(tasks.clone(), vcs.clone(), sink),
    ));
    let queue = Arc::new(TokioJobQueue::spawn(runner));

    let intake = Arc::new(WebhookIntake::new(
        EventClassifier::new(config.bot_account_id),
        EventDeduplicator::new(event_log, tasks.clone(), clock.clone()),
        gate.clone(),
        TaskDispatchService::new(tasks.clone(), gate, queue.clone(), clock.clone()),
        vcs,
        queue.clone(),
    ));
    let processor = ResultProcessor::new(
        tasks.clone(),
        queue,
        CostCalculator::new(config.pricing),
        clock,
    );

    let state = AppState {
        registry,
        intake,
        tokens,
        tasks,
        processor,
    };

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = bind.as_str(), "vunnix listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
