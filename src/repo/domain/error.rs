//! Error types for repository validation.

use thiserror::Error;

/// Errors returned while constructing repository values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoDomainError {
    /// The repository name does not follow `owner/repo` format.
    #[error("invalid repository name '{0}', expected owner/repo")]
    InvalidName(String),

    /// The repository path is empty after trimming.
    #[error("repository path must not be empty")]
    EmptyPath,
}
