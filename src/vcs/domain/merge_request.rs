//! Merge request metadata, diff positioning, and commit status values.

use super::MrIid;
use serde::{Deserialize, Serialize};

/// The three diff anchor SHAs GitLab requires to position an inline
/// discussion on the current version of a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRefs {
    /// Base commit of the target branch.
    pub base_sha: String,
    /// Start commit of the source branch.
    pub start_sha: String,
    /// Head commit of the source branch.
    pub head_sha: String,
}

/// Merge request metadata returned by the GitLab API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequestInfo {
    /// Merge request iid within its project.
    pub iid: MrIid,
    /// Source branch name.
    pub source_branch: String,
    /// Head commit SHA of the source branch.
    pub head_sha: String,
    /// Diff anchors for inline discussion positioning.
    pub diff_refs: DiffRefs,
}

/// A text position on the new side of a merge request diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffPosition {
    /// Diff anchors the position is relative to.
    pub diff_refs: DiffRefs,
    /// File path on the new side of the diff.
    pub new_path: String,
    /// Line number on the new side of the diff.
    pub new_line: u32,
}

/// Parameters for creating a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMergeRequest {
    /// Source branch the work was pushed to.
    pub source_branch: String,
    /// Target branch to merge into.
    pub target_branch: String,
    /// Merge request title.
    pub title: String,
    /// Merge request description body.
    pub description: String,
}

/// Mutable merge request fields for update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequestUpdate {
    /// Replacement title, when set.
    pub title: Option<String>,
    /// Replacement description, when set.
    pub description: Option<String>,
}

/// Commit status outcome reported to GitLab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// The review passed (no critical findings).
    Success,
    /// The review failed (at least one critical finding).
    Failed,
}

impl CommitState {
    /// Returns the GitLab API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Commit status payload: the state plus its display context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatusRequest {
    /// Reported state.
    pub state: CommitState,
    /// Status context name shown in the GitLab UI.
    pub name: String,
    /// Human-readable status description.
    pub description: String,
}
