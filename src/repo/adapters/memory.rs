//! In-memory repository registry.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::repo::{
    domain::{RepoName, Repository},
    ports::{RepositoryStore, RepositoryStoreError, RepositoryStoreResult},
};

/// Thread-safe in-memory repository registry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepositoryStore {
    state: Arc<RwLock<BTreeMap<RepoName, Repository>>>,
}

impl InMemoryRepositoryStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> RepositoryStoreError {
    RepositoryStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn insert(&self, repository: &Repository) -> RepositoryStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(repository.name()) {
            return Err(RepositoryStoreError::Duplicate(repository.name().clone()));
        }
        state.insert(repository.name().clone(), repository.clone());
        Ok(())
    }

    async fn find(&self, name: &RepoName) -> RepositoryStoreResult<Option<Repository>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(name).cloned())
    }

    async fn list(&self) -> RepositoryStoreResult<Vec<Repository>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.values().cloned().collect())
    }
}
