//! In-memory agent session repository for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::agent::{
    domain::{AgentSession, AgentSessionId},
    ports::{AgentSessionRepository, AgentSessionRepositoryError, AgentSessionRepositoryResult},
};
use crate::branch::domain::BranchKey;

/// Thread-safe in-memory agent session repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentSessionRepository {
    state: Arc<RwLock<HashMap<AgentSessionId, AgentSession>>>,
}

impl InMemoryAgentSessionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> AgentSessionRepositoryError {
    AgentSessionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AgentSessionRepository for InMemoryAgentSessionRepository {
    async fn insert(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&session.id()) {
            return Err(AgentSessionRepositoryError::Duplicate(session.id()));
        }
        state.insert(session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .get_mut(&session.id())
            .ok_or(AgentSessionRepositoryError::NotFound(session.id()))?;
        *stored = session.clone();
        Ok(())
    }

    async fn find(&self, id: AgentSessionId) -> AgentSessionRepositoryResult<Option<AgentSession>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_for_branch(
        &self,
        branch: &BranchKey,
    ) -> AgentSessionRepositoryResult<Vec<AgentSession>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut sessions: Vec<AgentSession> = state
            .values()
            .filter(|session| session.branch() == branch)
            .cloned()
            .collect();
        sessions.sort_by_key(|session| (session.started_at(), session.id()));
        Ok(sessions)
    }
}
