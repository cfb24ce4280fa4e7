//! Error types for agent session validation and transitions.

use super::{AgentSessionId, AgentSessionStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning agent sessions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent type is empty or malformed.
    #[error("invalid agent type '{0}'")]
    InvalidAgentType(String),

    /// The prompt is blank.
    #[error("agent prompt must not be empty")]
    EmptyPrompt,

    /// The session identifier is not a UUID.
    #[error("invalid agent session id '{0}'")]
    InvalidSessionId(String),

    /// The state machine forbids the transition.
    #[error("agent session {session} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Session identifier.
        session: AgentSessionId,
        /// Current status.
        from: AgentSessionStatus,
        /// Requested status.
        to: AgentSessionStatus,
    },

    /// The session has no recorded process.
    #[error("agent session {0} has no process id")]
    NoProcess(AgentSessionId),
}

/// Error returned while parsing session statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown agent session status: {0}")]
pub struct ParseAgentSessionStatusError(pub String);
