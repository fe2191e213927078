//! Ports onto external collaborators: project configuration, project
//! registration, and acceptance analytics.

use crate::task::domain::{ProjectId, ProjectRef, TaskId, UserId};
use crate::vcs::domain::{ActorId, DiscussionId, MrIid};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration lookups.
pub type ConfigResolverResult<T> = Result<T, ConfigResolverError>;

/// Which layer of the configuration cascade produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Project-level override.
    Project,
    /// Instance-wide setting.
    Global,
    /// Repository file configuration.
    File,
    /// Built-in default.
    Default,
}

/// A resolved configuration value and its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSetting {
    /// The configuration value.
    pub value: serde_json::Value,
    /// The cascade layer it came from.
    pub source: ConfigSource,
}

/// Read access to the layered project configuration cascade.
///
/// The cascade's precedence rules live with the collaborator; the core only
/// asks for the effective value of a key.
#[async_trait]
pub trait ConfigResolver: Send + Sync {
    /// Resolves the effective value of a configuration key for a project.
    /// Returns `None` when no layer defines it.
    async fn get(
        &self,
        project_id: ProjectId,
        key: &str,
    ) -> ConfigResolverResult<Option<ResolvedSetting>>;
}

/// Errors from the configuration collaborator.
#[derive(Debug, Clone, Error)]
#[error("config resolution failed: {0}")]
pub struct ConfigResolverError(pub Arc<dyn std::error::Error + Send + Sync>);

impl ConfigResolverError {
    /// Wraps a collaborator failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Result type for project registry lookups.
pub type ProjectRegistryResult<T> = Result<T, ProjectRegistryError>;

/// Resolves inbound webhook credentials to registered projects.
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    /// Resolves the project a webhook secret belongs to. Returns `None`
    /// for unknown secrets.
    async fn resolve_webhook_secret(
        &self,
        secret: &str,
    ) -> ProjectRegistryResult<Option<ProjectRef>>;
}

/// Errors from the project registry collaborator.
#[derive(Debug, Clone, Error)]
#[error("project registry lookup failed: {0}")]
pub struct ProjectRegistryError(pub Arc<dyn std::error::Error + Send + Sync>);

impl ProjectRegistryError {
    /// Wraps a collaborator failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Result type for permission gate lookups.
pub type PermissionGateResult<T> = Result<T, PermissionGateError>;

/// Capabilities the core checks before acting on behalf of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Permission to trigger reviews and AI commands on a project.
    ReviewTrigger,
}

impl Capability {
    /// Returns the canonical capability key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReviewTrigger => "review.trigger",
        }
    }
}

/// Resolves webhook actors to internal users and answers capability
/// questions for them.
///
/// Membership sync and role administration live with the collaborator; the
/// core only asks who an actor is and what they may do.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Resolves a GitLab actor to an internal user, when one exists.
    async fn resolve_user(&self, actor: ActorId) -> PermissionGateResult<Option<UserId>>;

    /// Returns whether the user holds the capability on the project.
    async fn authorize(
        &self,
        user_id: UserId,
        capability: Capability,
        project_id: ProjectId,
    ) -> PermissionGateResult<bool>;
}

/// Errors from the permission collaborator.
#[derive(Debug, Clone, Error)]
#[error("permission lookup failed: {0}")]
pub struct PermissionGateError(pub Arc<dyn std::error::Error + Send + Sync>);

impl PermissionGateError {
    /// Wraps a collaborator failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Result type for acceptance sink writes.
pub type AcceptanceSinkResult<T> = Result<T, AcceptanceSinkError>;

/// Resolution state of an AI-authored discussion thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// The thread was resolved by an engineer.
    Resolved,
    /// The thread exists and is unresolved.
    Unresolved,
    /// No matching thread was found for the finding.
    Dismissed,
}

/// Acceptance record for one finding of a merged review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingAcceptanceRecord {
    /// Task that produced the finding.
    pub task_id: TaskId,
    /// Finding number within the task result.
    pub finding_id: u32,
    /// Project the merge request belongs to.
    pub project_id: ProjectId,
    /// Merge request the finding was posted on.
    pub mr_iid: MrIid,
    /// File the finding pointed at.
    pub file: String,
    /// Finding title.
    pub title: String,
    /// Matched discussion, when one was found.
    pub discussion_id: Option<DiscussionId>,
    /// Thread resolution state at merge time.
    pub state: ThreadState,
}

/// A push correlated against prior review findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeChangeCorrelation {
    /// Project the push belongs to.
    pub project_id: ProjectId,
    /// Open merge request for the pushed branch.
    pub mr_iid: MrIid,
    /// Commit range start.
    pub before_sha: String,
    /// Commit range end.
    pub after_sha: String,
}

/// Write-side of the acceptance analytics collaborator.
#[async_trait]
pub trait AcceptanceSink: Send + Sync {
    /// Records the acceptance state of a finding at merge time.
    async fn record_finding(&self, record: FindingAcceptanceRecord) -> AcceptanceSinkResult<()>;

    /// Records a push for correlation against earlier findings.
    async fn record_code_change(
        &self,
        correlation: CodeChangeCorrelation,
    ) -> AcceptanceSinkResult<()>;
}

/// Errors from the acceptance analytics collaborator.
#[derive(Debug, Clone, Error)]
#[error("acceptance sink write failed: {0}")]
pub struct AcceptanceSinkError(pub Arc<dyn std::error::Error + Send + Sync>);

impl AcceptanceSinkError {
    /// Wraps a collaborator failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
