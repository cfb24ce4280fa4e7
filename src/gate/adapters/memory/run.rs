//! In-memory gate run history for tests and local runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::branch::domain::BranchKey;
use crate::gate::{
    domain::{GateName, GateRun, GateRunId, GateRunStatus, NewGateRun},
    ports::{GateRunRepository, GateRunRepositoryError, GateRunRepositoryResult},
};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    runs: BTreeMap<GateRunId, GateRun>,
}

/// Thread-safe in-memory gate run repository with monotonically increasing
/// ids starting at 1.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateRunRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryGateRunRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> GateRunRepositoryError {
    GateRunRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl GateRunRepository for InMemoryGateRunRepository {
    async fn insert(&self, run: NewGateRun) -> GateRunRepositoryResult<GateRun> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.next_id += 1;
        let id = GateRunId::new(state.next_id);
        let stored = GateRun::started(id, run);
        state.runs.insert(id, stored.clone());
        Ok(stored)
    }

    async fn finish(&self, run: &GateRun) -> GateRunRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        match state.runs.get_mut(&run.id()) {
            Some(stored) if stored.status() == GateRunStatus::Running => {
                *stored = run.clone();
                Ok(())
            }
            _ => Err(GateRunRepositoryError::NotRunning(run.id())),
        }
    }

    async fn find(&self, id: GateRunId) -> GateRunRepositoryResult<Option<GateRun>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.runs.get(&id).cloned())
    }

    async fn latest(
        &self,
        branch: &BranchKey,
        gate: &GateName,
    ) -> GateRunRepositoryResult<Option<GateRun>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .runs
            .values()
            .rev()
            .find(|run| run.branch() == branch && run.gate() == gate)
            .cloned())
    }

    async fn list_for_branch(&self, branch: &BranchKey) -> GateRunRepositoryResult<Vec<GateRun>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .runs
            .values()
            .filter(|run| run.branch() == branch)
            .cloned()
            .collect())
    }
}
