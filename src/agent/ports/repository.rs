//! Repository port for agent session persistence.

use crate::agent::domain::{AgentSession, AgentSessionId};
use crate::branch::domain::BranchKey;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent session repository operations.
pub type AgentSessionRepositoryResult<T> = Result<T, AgentSessionRepositoryError>;

/// Agent session persistence contract.
#[async_trait]
pub trait AgentSessionRepository: Send + Sync {
    /// Stores a new session.
    async fn insert(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()>;

    /// Persists pid, status, exit code and end time as one row update.
    ///
    /// # Errors
    ///
    /// Returns [`AgentSessionRepositoryError::NotFound`] when the session
    /// does not exist.
    async fn update(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()>;

    /// Finds a session by id.
    async fn find(&self, id: AgentSessionId) -> AgentSessionRepositoryResult<Option<AgentSession>>;

    /// Lists sessions for a branch, oldest first.
    async fn list_for_branch(
        &self,
        branch: &BranchKey,
    ) -> AgentSessionRepositoryResult<Vec<AgentSession>>;
}

/// Errors returned by agent session repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AgentSessionRepositoryError {
    /// A session with the same id already exists.
    #[error("duplicate agent session: {0}")]
    Duplicate(AgentSessionId),

    /// The session was not found.
    #[error("agent session not found: {0}")]
    NotFound(AgentSessionId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentSessionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
