//! The GitLab client capability contract.

use crate::vcs::domain::{
    CommitStatusRequest, DiffPosition, Discussion, DiscussionId, GitlabProjectId, IssueIid,
    MergeRequestInfo, MergeRequestUpdate, MrIid, NewMergeRequest, NoteId, PipelineId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for VCS client operations.
pub type VcsResult<T> = Result<T, VcsClientError>;

/// Parameters for triggering a CI pipeline on the external runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTriggerRequest {
    /// Branch or tag name to run the pipeline on.
    pub ref_name: String,
    /// CI trigger token scoped to the project.
    pub trigger_token: String,
    /// Pipeline variables handed to the executor.
    pub variables: Vec<(String, String)>,
}

/// Everything the core needs from the GitLab API.
///
/// Reconciliation components receive this trait as their only side-effect
/// channel; test doubles record the calls instead of performing them.
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Creates a note on a merge request and returns its id.
    async fn create_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
    ) -> VcsResult<NoteId>;

    /// Replaces the body of an existing merge request note.
    async fn update_mr_note(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        note_id: NoteId,
        body: &str,
    ) -> VcsResult<()>;

    /// Creates a note on an issue and returns its id.
    async fn create_issue_note(
        &self,
        project: GitlabProjectId,
        issue_iid: IssueIid,
        body: &str,
    ) -> VcsResult<NoteId>;

    /// Lists all discussion threads on a merge request.
    async fn list_mr_discussions(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<Discussion>>;

    /// Creates an inline discussion thread positioned on the diff.
    async fn create_mr_discussion(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        body: &str,
        position: &DiffPosition,
    ) -> VcsResult<DiscussionId>;

    /// Adds labels to a merge request, preserving unrelated labels.
    async fn add_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()>;

    /// Removes specific labels from a merge request.
    async fn remove_mr_labels(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        labels: &[String],
    ) -> VcsResult<()>;

    /// Sets a commit status on the given SHA.
    async fn set_commit_status(
        &self,
        project: GitlabProjectId,
        sha: &str,
        status: &CommitStatusRequest,
    ) -> VcsResult<()>;

    /// Fetches merge request metadata (branch, head SHA, diff refs).
    async fn merge_request(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<MergeRequestInfo>;

    /// Returns the changed file paths of a merge request diff.
    async fn merge_request_changed_paths(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
    ) -> VcsResult<Vec<String>>;

    /// Finds the open merge request whose source branch matches, if any.
    async fn find_open_mr_for_branch(
        &self,
        project: GitlabProjectId,
        source_branch: &str,
    ) -> VcsResult<Option<MergeRequestInfo>>;

    /// Creates a merge request.
    async fn create_merge_request(
        &self,
        project: GitlabProjectId,
        params: &NewMergeRequest,
    ) -> VcsResult<MergeRequestInfo>;

    /// Updates title/description of an existing merge request.
    async fn update_merge_request(
        &self,
        project: GitlabProjectId,
        mr_iid: MrIid,
        params: &MergeRequestUpdate,
    ) -> VcsResult<()>;

    /// Triggers a CI pipeline and returns its id.
    async fn trigger_pipeline(
        &self,
        project: GitlabProjectId,
        request: &PipelineTriggerRequest,
    ) -> VcsResult<PipelineId>;
}

/// Errors surfaced by VCS client implementations.
#[derive(Debug, Clone, Error)]
pub enum VcsClientError {
    /// The API rejected the call because the resource already exists or is
    /// already in the requested state.
    #[error("idempotent conflict from VCS API: {message}")]
    Conflict {
        /// Response body or message describing the conflict.
        message: String,
    },

    /// The API returned a non-success status.
    #[error("VCS API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// The request never produced an API response.
    #[error("VCS transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl VcsClientError {
    /// Wraps a transport-level failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns `true` when the error means the requested state already
    /// holds (e.g. a label that already exists). Reconciliation swallows
    /// these as success.
    #[must_use]
    pub const fn is_idempotent_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
