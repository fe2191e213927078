//! Review strategy selection values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution strategy handed to the external pipeline runner.
///
/// Chosen from the changed file set of the merge request; security-sensitive
/// paths override every other signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStrategy {
    /// Security-sensitive files are in the diff.
    SecurityAudit,
    /// Both frontend and backend files changed.
    MixedReview,
    /// Only frontend files changed.
    FrontendReview,
    /// Backend files, unrecognized extensions, or an empty diff.
    BackendReview,
}

impl ReviewStrategy {
    /// Returns the pipeline-variable representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecurityAudit => "security-audit",
            Self::MixedReview => "mixed-review",
            Self::FrontendReview => "frontend-review",
            Self::BackendReview => "backend-review",
        }
    }
}

impl fmt::Display for ReviewStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
