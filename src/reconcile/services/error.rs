//! Shared error type for the posting services.

use crate::config::AcceptanceSinkError;
use crate::reconcile::format::SummaryFormatError;
use crate::task::ports::TaskRepositoryError;
use crate::vcs::ports::VcsClientError;
use thiserror::Error;

/// Errors surfaced by reconciliation.
///
/// These never propagate into task state: the job runner logs them and the
/// already-completed task stays completed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// A non-idempotent VCS API failure.
    #[error(transparent)]
    Vcs(#[from] VcsClientError),
    /// Summary template rendering failed.
    #[error(transparent)]
    Format(#[from] SummaryFormatError),
    /// The acceptance analytics collaborator failed.
    #[error(transparent)]
    Acceptance(#[from] AcceptanceSinkError),
}
