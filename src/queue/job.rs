//! The background job envelope.

use crate::task::domain::{ProjectRef, TaskId};
use crate::vcs::domain::MrIid;

/// One unit of background work.
///
/// Task-scoped jobs carry only the task id and reload the aggregate when
/// they run, so a job observes the task's current state rather than the
/// state at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Dispatch a queued task to the external pipeline.
    ProcessTask(TaskId),
    /// Create or update the review summary comment.
    PostSummaryComment(TaskId),
    /// Post inline discussion threads for actionable findings.
    PostInlineThreads(TaskId),
    /// Apply review labels and set the commit status.
    PostLabelsAndStatus(TaskId),
    /// Post the answer comment for an ask command or issue discussion.
    PostAnswerComment(TaskId),
    /// Create the merge request and issue summary for a feature-dev task.
    PostFeatureDevResult(TaskId),
    /// Post a usage hint for an unrecognized `@ai` command.
    PostHelpResponse {
        /// Project the merge request lives in.
        project: ProjectRef,
        /// Merge request the command was posted on.
        mr_iid: MrIid,
        /// The unrecognized command text.
        command: String,
    },
    /// Correlate review findings with thread resolution after a merge.
    TrackAcceptance {
        /// Project the merge request lives in.
        project: ProjectRef,
        /// Merged merge request.
        mr_iid: MrIid,
    },
    /// Correlate a push's commit range against earlier findings.
    CorrelateCodeChange {
        /// Project the push belongs to.
        project: ProjectRef,
        /// Open merge request for the pushed branch.
        mr_iid: MrIid,
        /// Commit range start.
        before_sha: String,
        /// Commit range end.
        after_sha: String,
    },
}

impl Job {
    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProcessTask(_) => "process_task",
            Self::PostSummaryComment(_) => "post_summary_comment",
            Self::PostInlineThreads(_) => "post_inline_threads",
            Self::PostLabelsAndStatus(_) => "post_labels_and_status",
            Self::PostAnswerComment(_) => "post_answer_comment",
            Self::PostFeatureDevResult(_) => "post_feature_dev_result",
            Self::PostHelpResponse { .. } => "post_help_response",
            Self::TrackAcceptance { .. } => "track_acceptance",
            Self::CorrelateCodeChange { .. } => "correlate_code_change",
        }
    }
}
