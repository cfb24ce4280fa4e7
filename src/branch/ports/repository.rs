//! Repository port for branch persistence and lookup.

use crate::branch::domain::{Branch, BranchKey, BranchStatus};
use crate::repo::domain::RepoName;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for branch repository operations.
pub type BranchRepositoryResult<T> = Result<T, BranchRepositoryError>;

/// Filter for listing branches. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchFilter {
    /// Restrict to one repository.
    pub repo: Option<RepoName>,
    /// Restrict to one status.
    pub status: Option<BranchStatus>,
}

impl BranchFilter {
    /// Restricts the filter to a repository.
    #[must_use]
    pub fn in_repo(mut self, repo: RepoName) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Restricts the filter to a status.
    #[must_use]
    pub const fn with_status(mut self, status: BranchStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns whether `branch` satisfies the filter.
    #[must_use]
    pub fn matches(&self, branch: &Branch) -> bool {
        self.repo
            .as_ref()
            .is_none_or(|repo| branch.key().repo() == repo)
            && self.status.is_none_or(|status| branch.status() == status)
    }
}

/// Branch persistence contract.
#[async_trait]
pub trait BranchRepository: Send + Sync {
    /// Stores a new branch.
    ///
    /// # Errors
    ///
    /// Returns [`BranchRepositoryError::Duplicate`] when the key already
    /// exists.
    async fn insert(&self, branch: &Branch) -> BranchRepositoryResult<()>;

    /// Persists the mutable fields of an existing branch as one row update.
    ///
    /// # Errors
    ///
    /// Returns [`BranchRepositoryError::NotFound`] when the branch does not
    /// exist.
    async fn update(&self, branch: &Branch) -> BranchRepositoryResult<()>;

    /// Finds a branch by key.
    async fn find(&self, key: &BranchKey) -> BranchRepositoryResult<Option<Branch>>;

    /// Lists branches matching `filter`, ordered by key.
    async fn list(&self, filter: &BranchFilter) -> BranchRepositoryResult<Vec<Branch>>;
}

/// Errors returned by branch repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BranchRepositoryError {
    /// A branch with the same key already exists.
    #[error("duplicate branch: {0}")]
    Duplicate(BranchKey),

    /// The branch was not found.
    #[error("branch not found: {0}")]
    NotFound(BranchKey),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BranchRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
