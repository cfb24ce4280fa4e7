//! Append-only store for gate run history.

use crate::branch::domain::BranchKey;
use crate::gate::domain::{GateName, GateRun, GateRunId, NewGateRun};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for gate run repository operations.
pub type GateRunRepositoryResult<T> = Result<T, GateRunRepositoryError>;

/// Gate run persistence contract.
///
/// Rows are never deleted and never modified after reaching a terminal
/// status.
#[async_trait]
pub trait GateRunRepository: Send + Sync {
    /// Inserts a `running` row and returns it with its assigned id.
    async fn insert(&self, run: NewGateRun) -> GateRunRepositoryResult<GateRun>;

    /// Persists the terminal status, exit code and finish time of `run` as a
    /// single update applied only while the stored row is still running.
    ///
    /// # Errors
    ///
    /// Returns [`GateRunRepositoryError::NotRunning`] when the stored row is
    /// missing or already terminal.
    async fn finish(&self, run: &GateRun) -> GateRunRepositoryResult<()>;

    /// Finds a run by id.
    async fn find(&self, id: GateRunId) -> GateRunRepositoryResult<Option<GateRun>>;

    /// Returns the run with the highest id for `(branch, gate)`.
    async fn latest(
        &self,
        branch: &BranchKey,
        gate: &GateName,
    ) -> GateRunRepositoryResult<Option<GateRun>>;

    /// Lists every run for `branch` in id order.
    async fn list_for_branch(&self, branch: &BranchKey) -> GateRunRepositoryResult<Vec<GateRun>>;
}

/// Errors returned by gate run repository implementations.
#[derive(Debug, Clone, Error)]
pub enum GateRunRepositoryError {
    /// The run does not exist or is no longer running.
    #[error("gate run {0} is not running")]
    NotRunning(GateRunId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl GateRunRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
