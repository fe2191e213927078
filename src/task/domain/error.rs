//! Error types for task domain validation and result parsing.

use super::{TaskId, TaskStatus, TaskType};
use thiserror::Error;

/// Errors returned while mutating task aggregates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested status transition is not permitted by the state
    /// machine.
    #[error("invalid task transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Rejected target status.
        to: TaskStatus,
    },
}

/// Error returned when an executor result payload does not match the
/// schema for the task's type.
#[derive(Debug, Clone, Error)]
#[error("result payload does not match the {task_type} schema: {reason}")]
pub struct ResultParseError {
    /// Task type whose schema was applied.
    pub task_type: TaskType,
    /// Deserialization failure detail.
    pub reason: String,
}
