//! Narrow launch contract used by the branch lifecycle manager.

use super::{AgentSessionService, AgentSessionServiceResult};
use crate::agent::domain::AgentSession;
use crate::branch::domain::BranchKey;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use mockable::Clock;

/// Request to run one agent to completion in a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchAgentRequest {
    /// Branch the agent works in.
    pub branch: BranchKey,
    /// Configured agent type.
    pub agent_type: String,
    /// Prompt handed to the agent.
    pub prompt: String,
    /// Checkout directory.
    pub checkout: Utf8PathBuf,
}

/// Spawns an agent and blocks until it exits.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Runs the agent and returns the reaped session.
    async fn launch(&self, request: LaunchAgentRequest) -> AgentSessionServiceResult<AgentSession>;
}

#[async_trait]
impl<C> AgentLauncher for AgentSessionService<C>
where
    C: Clock + Send + Sync,
{
    async fn launch(&self, request: LaunchAgentRequest) -> AgentSessionServiceResult<AgentSession> {
        let running = self.spawn(request).await?;
        self.wait(running).await
    }
}
