//! Job execution against the dispatch and reconciliation services.

use tracing::warn;

use super::Job;
use crate::reconcile::services::{
    AcceptanceTracker, AnswerPoster, FeatureDevPoster, HelpResponsePoster, LabelStatusPoster,
    SummaryPoster, ThreadPoster,
};
use crate::task::services::TaskDispatcher;

/// Executes background jobs.
///
/// Job failures are logged and swallowed: reconciliation is best-effort
/// against an external system and must never fail the task that spawned
/// it.
#[derive(Clone)]
pub struct JobRunner {
    dispatcher: TaskDispatcher,
    summary: SummaryPoster,
    threads: ThreadPoster,
    labels: LabelStatusPoster,
    answer: AnswerPoster,
    feature_dev: FeatureDevPoster,
    help: HelpResponsePoster,
    acceptance: AcceptanceTracker,
}

impl JobRunner {
    /// Creates a runner over the dispatch and posting services.
    #[must_use]
    #[expect(
        clippy::too_many_arguments,
        reason = "the runner aggregates every job handler once at wiring time"
    )]
    pub const fn new(
        dispatcher: TaskDispatcher,
        summary: SummaryPoster,
        threads: ThreadPoster,
        labels: LabelStatusPoster,
        answer: AnswerPoster,
        feature_dev: FeatureDevPoster,
        help: HelpResponsePoster,
        acceptance: AcceptanceTracker,
    ) -> Self {
        Self {
            dispatcher,
            summary,
            threads,
            labels,
            answer,
            feature_dev,
            help,
            acceptance,
        }
    }

    /// Runs one job to completion, logging any failure.
    pub async fn run(&self, job: Job) {
        let name = job.name();
        let outcome = match job {
            Job::ProcessTask(task_id) => self
                .dispatcher
                .dispatch(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostSummaryComment(task_id) => self
                .summary
                .post(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostInlineThreads(task_id) => self
                .threads
                .post(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostLabelsAndStatus(task_id) => self
                .labels
                .post(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostAnswerComment(task_id) => self
                .answer
                .post(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostFeatureDevResult(task_id) => self
                .feature_dev
                .post(task_id)
                .await
                .map_err(|err| err.to_string()),
            Job::PostHelpResponse {
                project,
                mr_iid,
                command,
            } => self
                .help
                .post(project, mr_iid, &command)
                .await
                .map_err(|err| err.to_string()),
            Job::TrackAcceptance { project, mr_iid } => self
                .acceptance
                .track_merge(project, mr_iid)
                .await
                .map_err(|err| err.to_string()),
            Job::CorrelateCodeChange {
                project,
                mr_iid,
                before_sha,
                after_sha,
            } => self
                .acceptance
                .correlate_push(project, mr_iid, &before_sha, &after_sha)
                .await
                .map_err(|err| err.to_string()),
        };

        if let Err(error) = outcome {
            warn!(job = name, error = error.as_str(), "background job failed");
        }
    }
}
