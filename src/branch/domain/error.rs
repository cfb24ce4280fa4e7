//! Error types for branch validation and lifecycle transitions.

use super::{BranchKey, BranchStatus};
use crate::repo::domain::RepoDomainError;
use thiserror::Error;

/// Errors returned while constructing or transitioning branches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BranchDomainError {
    /// The repository component is invalid.
    #[error(transparent)]
    Repo(#[from] RepoDomainError),

    /// The branch name is not a valid git branch name.
    #[error("invalid branch name '{0}'")]
    InvalidName(String),

    /// The branch name is reserved for the integration branch.
    #[error("branch name '{0}' is reserved for the integration branch")]
    ReservedName(String),

    /// The branch key is not of the form `owner/repo/name`.
    #[error("invalid branch key '{0}', expected owner/repo/name")]
    InvalidKey(String),

    /// A git revision was empty.
    #[error("revision must not be empty")]
    EmptyRevision,

    /// The branch is not active.
    #[error("branch {branch} is {status}, not active")]
    NotActive {
        /// Branch key.
        branch: BranchKey,
        /// Current status.
        status: BranchStatus,
    },
}

/// Error returned while parsing branch statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown branch status: {0}")]
pub struct ParseBranchStatusError(pub String);

/// Error returned while parsing environment backends from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown environment backend: {0}")]
pub struct ParseEnvironmentBackendError(pub String);
