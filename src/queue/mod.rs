//! Background job fan-out.
//!
//! Intake endpoints validate and persist synchronously; everything that
//! talks to GitLab afterwards — dispatching a task to the pipeline, posting
//! reconciliation artifacts, acceptance correlation — rides a [`Job`]
//! through the [`JobQueue`] port. The inline adapter executes jobs
//! immediately (tests and sync deployments); the Tokio adapter feeds a
//! single worker loop, which serializes summary-comment updates per
//! comment id as a side effect of serializing everything.

mod adapters;
mod job;
mod ports;
mod runner;

pub use adapters::{InlineJobQueue, TokioJobQueue};
pub use job::Job;
pub use ports::{JobQueue, JobQueueError, JobQueueResult};
pub use runner::JobRunner;
