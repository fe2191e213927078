//! In-memory adapters for the collaborator ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ports::{
    AcceptanceSink, AcceptanceSinkError, AcceptanceSinkResult, Capability, CodeChangeCorrelation,
    ConfigResolver, ConfigResolverError, ConfigResolverResult, ConfigSource,
    FindingAcceptanceRecord, PermissionGate, PermissionGateError, PermissionGateResult,
    ProjectRegistry, ProjectRegistryError, ProjectRegistryResult, ResolvedSetting,
};
use crate::task::domain::{ProjectId, ProjectRef, UserId};
use crate::vcs::domain::ActorId;

/// In-memory configuration resolver serving pre-seeded project settings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigResolver {
    settings: Arc<RwLock<HashMap<(u64, String), serde_json::Value>>>,
}

impl InMemoryConfigResolver {
    /// Creates a resolver with no settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a project-level setting.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn insert(&self, project_id: ProjectId, key: impl Into<String>, value: serde_json::Value) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut settings = self.settings.write().expect("config lock poisoned");
        settings.insert((project_id.value(), key.into()), value);
    }
}

#[async_trait]
impl ConfigResolver for InMemoryConfigResolver {
    async fn get(
        &self,
        project_id: ProjectId,
        key: &str,
    ) -> ConfigResolverResult<Option<ResolvedSetting>> {
        let settings = self
            .settings
            .read()
            .map_err(|err| ConfigResolverError::new(std::io::Error::other(err.to_string())))?;
        Ok(settings
            .get(&(project_id.value(), key.to_owned()))
            .map(|value| ResolvedSetting {
                value: value.clone(),
                source: ConfigSource::Project,
            }))
    }
}

/// In-memory project registry keyed by webhook secret.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRegistry {
    projects: Arc<RwLock<HashMap<String, ProjectRef>>>,
}

impl InMemoryProjectRegistry {
    /// Creates a registry with no projects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project under its webhook secret.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn register(&self, secret: impl Into<String>, project: ProjectRef) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut projects = self.projects.write().expect("registry lock poisoned");
        projects.insert(secret.into(), project);
    }
}

#[async_trait]
impl ProjectRegistry for InMemoryProjectRegistry {
    async fn resolve_webhook_secret(
        &self,
        secret: &str,
    ) -> ProjectRegistryResult<Option<ProjectRef>> {
        let projects = self
            .projects
            .read()
            .map_err(|err| ProjectRegistryError::new(std::io::Error::other(err.to_string())))?;
        Ok(projects.get(secret).copied())
    }
}

/// In-memory permission gate with explicit user and capability grants.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPermissionGate {
    state: Arc<RwLock<PermissionState>>,
}

#[derive(Debug, Default)]
struct PermissionState {
    users: HashMap<u64, UserId>,
    grants: HashMap<(u64, &'static str, u64), bool>,
}

impl InMemoryPermissionGate {
    /// Creates a gate that knows no users and grants nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GitLab actor as an internal user.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn register_user(&self, actor: ActorId, user_id: UserId) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("gate lock poisoned");
        state.users.insert(actor.value(), user_id);
    }

    /// Grants a capability to a user on a project.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    pub fn grant(&self, user_id: UserId, capability: Capability, project_id: ProjectId) {
        #[expect(clippy::expect_used, reason = "fixture seeding has no error channel")]
        let mut state = self.state.write().expect("gate lock poisoned");
        state
            .grants
            .insert((user_id.value(), capability.as_str(), project_id.value()), true);
    }
}

#[async_trait]
impl PermissionGate for InMemoryPermissionGate {
    async fn resolve_user(&self, actor: ActorId) -> PermissionGateResult<Option<UserId>> {
        let state = self
            .state
            .read()
            .map_err(|err| PermissionGateError::new(std::io::Error::other(err.to_string())))?;
        Ok(state.users.get(&actor.value()).copied())
    }

    async fn authorize(
        &self,
        user_id: UserId,
        capability: Capability,
        project_id: ProjectId,
    ) -> PermissionGateResult<bool> {
        let state = self
            .state
            .read()
            .map_err(|err| PermissionGateError::new(std::io::Error::other(err.to_string())))?;
        Ok(state
            .grants
            .get(&(user_id.value(), capability.as_str(), project_id.value()))
            .copied()
            .unwrap_or(false))
    }
}

/// In-memory acceptance sink recording everything it is handed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAcceptanceSink {
    findings: Arc<RwLock<Vec<FindingAcceptanceRecord>>>,
    code_changes: Arc<RwLock<Vec<CodeChangeCorrelation>>>,
}

impl InMemoryAcceptanceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all finding acceptance records written so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn finding_records(&self) -> Vec<FindingAcceptanceRecord> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let findings = self.findings.read().expect("sink lock poisoned");
        findings.clone()
    }

    /// Returns all code change correlations written so far.
    ///
    /// # Panics
    ///
    /// Panics when the internal lock is poisoned.
    #[must_use]
    pub fn code_changes(&self) -> Vec<CodeChangeCorrelation> {
        #[expect(clippy::expect_used, reason = "test accessor has no error channel")]
        let code_changes = self.code_changes.read().expect("sink lock poisoned");
        code_changes.clone()
    }
}

#[async_trait]
impl AcceptanceSink for InMemoryAcceptanceSink {
    async fn record_finding(&self, record: FindingAcceptanceRecord) -> AcceptanceSinkResult<()> {
        let mut findings = self
            .findings
            .write()
            .map_err(|err| AcceptanceSinkError::new(std::io::Error::other(err.to_string())))?;
        findings.push(record);
        Ok(())
    }

    async fn record_code_change(
        &self,
        correlation: CodeChangeCorrelation,
    ) -> AcceptanceSinkResult<()> {
        let mut code_changes = self
            .code_changes
            .write()
            .map_err(|err| AcceptanceSinkError::new(std::io::Error::other(err.to_string())))?;
        code_changes.push(correlation);
        Ok(())
    }
}
