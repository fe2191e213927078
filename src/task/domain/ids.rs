//! Identifier newtypes for the task domain.

use crate::vcs::domain::GitlabProjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an internal task record.
///
/// Allocated sequentially by the repository; the value is opaque to
/// everything except the task-scoped token, which embeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

/// Internal project record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

/// Internal user record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

/// Identifier of a chat conversation that originated a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(u64);

macro_rules! numeric_id {
    ($name:ident) => {
        impl $name {
            /// Wraps a raw numeric value.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(TaskId);
numeric_id!(ProjectId);
numeric_id!(UserId);
numeric_id!(ConversationId);

/// The pair of identifiers every project-scoped operation needs: the
/// internal record id and the GitLab-side project id for API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Internal project record id.
    pub project_id: ProjectId,
    /// GitLab project id used for API calls.
    pub gitlab_project_id: GitlabProjectId,
}

impl ProjectRef {
    /// Creates a project reference from both identifiers.
    #[must_use]
    pub const fn new(project_id: ProjectId, gitlab_project_id: GitlabProjectId) -> Self {
        Self {
            project_id,
            gitlab_project_id,
        }
    }
}
