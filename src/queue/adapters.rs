//! Queue adapters: inline execution and a Tokio worker loop.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use super::{Job, JobQueue, JobQueueError, JobQueueResult, JobRunner};

/// Executes every job inline before `enqueue` returns.
///
/// The sync-mode adapter: tests and single-process deployments get fully
/// deterministic ordering, at the price of doing GitLab I/O on the
/// caller's task.
#[derive(Clone)]
pub struct InlineJobQueue {
    runner: Arc<JobRunner>,
}

impl InlineJobQueue {
    /// Creates an inline queue over the runner.
    #[must_use]
    pub const fn new(runner: Arc<JobRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl JobQueue for InlineJobQueue {
    async fn enqueue(&self, job: Job) -> JobQueueResult<()> {
        self.runner.run(job).await;
        Ok(())
    }
}

/// Hands jobs to a single Tokio worker loop.
///
/// One consumer serializes all jobs, which also serializes summary-comment
/// updates per comment id; the other posters are permitted to interleave
/// but nothing requires it.
#[derive(Clone)]
pub struct TokioJobQueue {
    sender: mpsc::UnboundedSender<Job>,
}

impl TokioJobQueue {
    /// Spawns the worker loop and returns the queue handle.
    #[must_use]
    pub fn spawn(runner: Arc<JobRunner>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                runner.run(job).await;
            }
            info!("job queue worker stopped");
        });
        Self { sender }
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn enqueue(&self, job: Job) -> JobQueueResult<()> {
        self.sender
            .send(job)
            .map_err(|err| JobQueueError::new(std::io::Error::other(err.to_string())))
    }
}
