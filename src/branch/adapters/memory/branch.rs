//! In-memory repository for branch lifecycle tests and local runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::branch::{
    domain::{Branch, BranchKey},
    ports::{BranchFilter, BranchRepository, BranchRepositoryError, BranchRepositoryResult},
};

/// Thread-safe in-memory branch repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBranchRepository {
    state: Arc<RwLock<BTreeMap<BranchKey, Branch>>>,
}

impl InMemoryBranchRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> BranchRepositoryError {
    BranchRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl BranchRepository for InMemoryBranchRepository {
    async fn insert(&self, branch: &Branch) -> BranchRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(branch.key()) {
            return Err(BranchRepositoryError::Duplicate(branch.key().clone()));
        }
        state.insert(branch.key().clone(), branch.clone());
        Ok(())
    }

    async fn update(&self, branch: &Branch) -> BranchRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .get_mut(branch.key())
            .ok_or_else(|| BranchRepositoryError::NotFound(branch.key().clone()))?;
        *stored = branch.clone();
        Ok(())
    }

    async fn find(&self, key: &BranchKey) -> BranchRepositoryResult<Option<Branch>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(key).cloned())
    }

    async fn list(&self, filter: &BranchFilter) -> BranchRepositoryResult<Vec<Branch>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|branch| filter.matches(branch))
            .cloned()
            .collect())
    }
}
