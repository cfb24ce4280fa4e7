//! Agent session manager.

mod launcher;
mod session;

pub use launcher::{AgentLauncher, LaunchAgentRequest};
pub use session::{AgentSessionService, AgentSessionServiceError, AgentSessionServiceResult, RunningAgent};
