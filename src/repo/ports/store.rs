//! Persistence port for registered repositories.

use crate::repo::domain::{RepoName, Repository};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository store operations.
pub type RepositoryStoreResult<T> = Result<T, RepositoryStoreError>;

/// Repository registry persistence contract.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Stores a newly registered repository.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryStoreError::Duplicate`] when the name is taken.
    async fn insert(&self, repository: &Repository) -> RepositoryStoreResult<()>;

    /// Finds a repository by name.
    async fn find(&self, name: &RepoName) -> RepositoryStoreResult<Option<Repository>>;

    /// Lists every registered repository ordered by name.
    async fn list(&self) -> RepositoryStoreResult<Vec<Repository>>;
}

/// Errors returned by repository store implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryStoreError {
    /// A repository with the same name already exists.
    #[error("repository already registered: {0}")]
    Duplicate(RepoName),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
