//! Port contracts for agent sessions.

mod process;
mod repository;

pub use process::{
    AgentExit, AgentHostError, AgentLaunchSpec, AgentProcess, AgentProcessHost, TerminateOutcome,
};
pub use repository::{
    AgentSessionRepository, AgentSessionRepositoryError, AgentSessionRepositoryResult,
};
