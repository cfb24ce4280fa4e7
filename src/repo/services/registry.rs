//! Service layer for registering and resolving target repositories.

use crate::error::ErrorKind;
use crate::repo::{
    domain::{RepoDomainError, RepoName, Repository},
    ports::{RepositoryStore, RepositoryStoreError},
};
use camino::Utf8PathBuf;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for registering a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRepositoryRequest {
    /// Repository name in `owner/repo` form.
    pub name: String,
    /// Path of the bare origin repository.
    pub path: Utf8PathBuf,
}

impl RegisterRepositoryRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Service-level errors for the repository registry.
#[derive(Debug, Error)]
pub enum RepositoryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RepoDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] RepositoryStoreError),
    /// No repository is registered under the name.
    #[error("repository {0} not found")]
    NotFound(RepoName),
}

impl RepositoryServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Store(RepositoryStoreError::Duplicate(_)) => {
                ErrorKind::PreconditionFailed
            }
            Self::Store(RepositoryStoreError::Persistence(_)) => ErrorKind::ExternalToolFailure,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Result type for repository registry operations.
pub type RepositoryServiceResult<T> = Result<T, RepositoryServiceError>;

/// Repository registry service.
pub struct RepositoryService<C>
where
    C: Clock + Send + Sync,
{
    store: Arc<dyn RepositoryStore>,
    clock: Arc<C>,
}

impl<C> Clone for RepositoryService<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> RepositoryService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a registry service.
    #[must_use]
    pub const fn new(store: Arc<dyn RepositoryStore>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Registers a repository.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryServiceError::Domain`] for invalid names or paths
    /// and [`RepositoryServiceError::Store`] when the name is taken or the
    /// store fails.
    pub async fn register(
        &self,
        request: RegisterRepositoryRequest,
    ) -> RepositoryServiceResult<Repository> {
        let name = RepoName::new(request.name)?;
        let repository = Repository::new(name, request.path, &*self.clock)?;
        self.store.insert(&repository).await?;
        info!(repo = %repository.name(), path = %repository.path(), "registered repository");
        Ok(repository)
    }

    /// Resolves a registered repository.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryServiceError::NotFound`] when nothing is
    /// registered under `name`.
    pub async fn get(&self, name: &RepoName) -> RepositoryServiceResult<Repository> {
        self.store
            .find(name)
            .await?
            .ok_or_else(|| RepositoryServiceError::NotFound(name.clone()))
    }

    /// Lists registered repositories.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list(&self) -> RepositoryServiceResult<Vec<Repository>> {
        Ok(self.store.list().await?)
    }
}
