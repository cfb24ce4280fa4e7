//! Domain model for agent sessions.

mod error;
mod ids;
mod session;

pub use error::{AgentDomainError, ParseAgentSessionStatusError};
pub use ids::{AgentSessionId, AgentType, ProcessId};
pub use session::{
    AgentSession, AgentSessionStatus, NewAgentSession, PersistedAgentSessionData,
    KILLED_EXIT_CODE,
};
