//! Agent session aggregate and its state machine.

use super::{
    AgentDomainError, AgentSessionId, AgentType, ParseAgentSessionStatusError, ProcessId,
};
use crate::branch::domain::BranchKey;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code recorded when a session is killed or its process ends without
/// reporting one.
pub const KILLED_EXIT_CODE: i32 = -1;

/// Agent session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSessionStatus {
    /// Recorded, process not yet started.
    Created,
    /// Process is running.
    Running,
    /// Process exited zero.
    Completed,
    /// Process exited non-zero or was killed.
    Failed,
    /// The agent asked for human help; its process may still be running.
    NeedsHelp,
}

impl AgentSessionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NeedsHelp => "needs_help",
        }
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns whether a live process may be attached.
    #[must_use]
    pub const fn has_live_process(self) -> bool {
        matches!(self, Self::Running | Self::NeedsHelp)
    }
}

impl fmt::Display for AgentSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentSessionStatus {
    type Error = ParseAgentSessionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "needs_help" => Ok(Self::NeedsHelp),
            _ => Err(ParseAgentSessionStatusError(value.to_owned())),
        }
    }
}

/// Input for recording a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgentSession {
    /// Branch the agent works in.
    pub branch: BranchKey,
    /// Agent kind.
    pub agent_type: AgentType,
    /// Prompt handed to the agent.
    pub prompt: String,
}

/// Parameter object for reconstructing a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAgentSessionData {
    /// Session identifier.
    pub id: AgentSessionId,
    /// Branch the agent works in.
    pub branch: BranchKey,
    /// Agent kind.
    pub agent_type: AgentType,
    /// Prompt.
    pub prompt: String,
    /// Process id, once spawned.
    pub pid: Option<ProcessId>,
    /// Status.
    pub status: AgentSessionStatus,
    /// Exit code.
    pub exit_code: Option<i32>,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp.
    pub ended_at: Option<DateTime<Utc>>,
}

/// One coding-agent invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSession {
    id: AgentSessionId,
    branch: BranchKey,
    agent_type: AgentType,
    prompt: String,
    pid: Option<ProcessId>,
    status: AgentSessionStatus,
    exit_code: Option<i32>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl AgentSession {
    /// Creates a session in `created` status with no process.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::EmptyPrompt`] for a blank prompt.
    pub fn new(data: NewAgentSession, clock: &impl Clock) -> Result<Self, AgentDomainError> {
        if data.prompt.trim().is_empty() {
            return Err(AgentDomainError::EmptyPrompt);
        }
        Ok(Self {
            id: AgentSessionId::new(),
            branch: data.branch,
            agent_type: data.agent_type,
            prompt: data.prompt,
            pid: None,
            status: AgentSessionStatus::Created,
            exit_code: None,
            started_at: clock.utc(),
            ended_at: None,
        })
    }

    /// Reconstructs a session from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAgentSessionData) -> Self {
        Self {
            id: data.id,
            branch: data.branch,
            agent_type: data.agent_type,
            prompt: data.prompt,
            pid: data.pid,
            status: data.status,
            exit_code: data.exit_code,
            started_at: data.started_at,
            ended_at: data.ended_at,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> AgentSessionId {
        self.id
    }

    /// Returns the branch the agent works in.
    #[must_use]
    pub const fn branch(&self) -> &BranchKey {
        &self.branch
    }

    /// Returns the agent kind.
    #[must_use]
    pub const fn agent_type(&self) -> &AgentType {
        &self.agent_type
    }

    /// Returns the prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the process id, once spawned.
    #[must_use]
    pub const fn pid(&self) -> Option<ProcessId> {
        self.pid
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> AgentSessionStatus {
        self.status
    }

    /// Returns the exit code.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the terminal timestamp.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    const fn invalid(&self, to: AgentSessionStatus) -> AgentDomainError {
        AgentDomainError::InvalidTransition {
            session: self.id,
            from: self.status,
            to,
        }
    }

    /// Records the spawned process. The pid is set exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the session is
    /// `created`.
    pub fn mark_running(&mut self, pid: ProcessId) -> Result<(), AgentDomainError> {
        if self.status != AgentSessionStatus::Created || self.pid.is_some() {
            return Err(self.invalid(AgentSessionStatus::Running));
        }
        self.pid = Some(pid);
        self.status = AgentSessionStatus::Running;
        Ok(())
    }

    /// Records process exit. Exit code zero completes the session; anything
    /// else, including a signal without a code, fails it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless a process is
    /// attached.
    pub fn mark_exited(
        &mut self,
        code: Option<i32>,
        clock: &impl Clock,
    ) -> Result<(), AgentDomainError> {
        let target = match code {
            Some(0) => AgentSessionStatus::Completed,
            _ => AgentSessionStatus::Failed,
        };
        if !self.status.has_live_process() {
            return Err(self.invalid(target));
        }
        self.status = target;
        self.exit_code = Some(code.unwrap_or(KILLED_EXIT_CODE));
        self.ended_at = Some(clock.utc());
        Ok(())
    }

    /// Records a kill with the synthetic exit code `-1`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless a process is
    /// attached.
    pub fn mark_killed(&mut self, clock: &impl Clock) -> Result<(), AgentDomainError> {
        if !self.status.has_live_process() {
            return Err(self.invalid(AgentSessionStatus::Failed));
        }
        self.status = AgentSessionStatus::Failed;
        self.exit_code = Some(KILLED_EXIT_CODE);
        self.ended_at = Some(clock.utc());
        Ok(())
    }

    /// Flags that the agent needs human help.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless `running`.
    pub fn request_help(&mut self) -> Result<(), AgentDomainError> {
        if self.status != AgentSessionStatus::Running {
            return Err(self.invalid(AgentSessionStatus::NeedsHelp));
        }
        self.status = AgentSessionStatus::NeedsHelp;
        Ok(())
    }
}
