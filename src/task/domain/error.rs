//! Error types for task domain validation and parsing.

use super::{TaskKey, TaskStatus};
use crate::repo::domain::RepoDomainError;
use thiserror::Error;

/// Errors returned while constructing or transitioning tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The repository component is invalid.
    #[error(transparent)]
    Repo(#[from] RepoDomainError),

    /// The slug is empty or contains characters outside `[A-Za-z0-9._-]`.
    #[error("invalid task slug '{0}', expected letters, digits, '.', '_' or '-'")]
    InvalidSlug(String),

    /// A task reference is not of the form `owner/repo/slug`.
    #[error("invalid task reference '{0}', expected owner/repo/slug")]
    InvalidReference(String),

    /// The priority is outside 1..=5.
    #[error("invalid priority {0}, expected a value between 1 and 5")]
    InvalidPriority(i64),

    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task lists itself as a dependency.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskKey),

    /// The task lists the same dependency twice.
    #[error("task {task} lists dependency {dependency} more than once")]
    DuplicateDependency {
        /// Task being created.
        task: TaskKey,
        /// Repeated dependency.
        dependency: TaskKey,
    },

    /// Transitioning between two statuses is not allowed.
    #[error("invalid status transition for task {task}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task: TaskKey,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
