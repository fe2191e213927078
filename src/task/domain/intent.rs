//! Classified webhook intents and their task-type mapping.

use super::{TaskPriority, TaskType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The classified purpose of a webhook event.
///
/// Most intents dispatch a task; `HelpResponse` and `AcceptanceTracking`
/// only enqueue background jobs and never enter the task state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Automatic review on merge request open/update.
    AutoReview,
    /// `@ai review` command on a merge request note.
    OnDemandReview,
    /// Review of new commits pushed to an already-reviewed branch.
    IncrementalReview,
    /// `@ai improve` command on a merge request note.
    Improve,
    /// `@ai ask "…"` command with an extracted question.
    AskCommand,
    /// `@ai` mention on an issue note.
    IssueDiscussion,
    /// `ai::develop` label applied to an issue.
    FeatureDev,
    /// Unrecognized `@ai` command; answered with a usage hint.
    HelpResponse,
    /// Merge of a reviewed merge request; feeds acceptance correlation.
    AcceptanceTracking,
}

impl Intent {
    /// Returns the wire representation used in webhook responses and
    /// pipeline variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AutoReview => "auto_review",
            Self::OnDemandReview => "on_demand_review",
            Self::IncrementalReview => "incremental_review",
            Self::Improve => "improve",
            Self::AskCommand => "ask_command",
            Self::IssueDiscussion => "issue_discussion",
            Self::FeatureDev => "feature_dev",
            Self::HelpResponse => "help_response",
            Self::AcceptanceTracking => "acceptance_tracking",
        }
    }

    /// Returns the task type this intent dispatches, or `None` for
    /// intents handled entirely by background jobs.
    #[must_use]
    pub const fn task_type(self) -> Option<TaskType> {
        match self {
            Self::AutoReview | Self::OnDemandReview | Self::IncrementalReview | Self::Improve => {
                Some(TaskType::CodeReview)
            }
            Self::AskCommand | Self::IssueDiscussion => Some(TaskType::IssueDiscussion),
            Self::FeatureDev => Some(TaskType::FeatureDev),
            Self::HelpResponse | Self::AcceptanceTracking => None,
        }
    }

    /// Returns whether the acting user must hold the `review.trigger`
    /// capability on the project.
    ///
    /// Automatic and incremental reviews fire for every enabled project;
    /// explicit commands and label triggers are actor-gated.
    #[must_use]
    pub const fn requires_trigger_permission(self) -> bool {
        matches!(
            self,
            Self::OnDemandReview
                | Self::Improve
                | Self::AskCommand
                | Self::IssueDiscussion
                | Self::FeatureDev
        )
    }

    /// Returns the dispatch priority for this intent.
    #[must_use]
    pub const fn priority(self) -> TaskPriority {
        match self {
            Self::OnDemandReview => TaskPriority::High,
            Self::FeatureDev => TaskPriority::Low,
            _ => TaskPriority::Normal,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
