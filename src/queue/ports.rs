//! The job queue contract.

use super::Job;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for queue operations.
pub type JobQueueResult<T> = Result<T, JobQueueError>;

/// Accepts background jobs for eventual execution.
///
/// Implementations may run jobs inline before returning (sync mode) or
/// hand them to a worker; callers must not assume either.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues a job.
    async fn enqueue(&self, job: Job) -> JobQueueResult<()>;
}

/// Errors returned by queue implementations.
#[derive(Debug, Clone, Error)]
#[error("job queue failure: {0}")]
pub struct JobQueueError(pub Arc<dyn std::error::Error + Send + Sync>);

impl JobQueueError {
    /// Wraps a queue failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
