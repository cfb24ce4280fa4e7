//! Process-host contract for agent subprocesses.

use crate::agent::domain::ProcessId;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Fully rendered agent command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLaunchSpec {
    /// Shell command.
    pub command: String,
    /// Checkout the agent operates in.
    pub working_dir: Utf8PathBuf,
}

/// How an agent process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentExit {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

/// Result of a termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateOutcome {
    /// The termination signal was delivered.
    Signalled,
    /// No process with that id was running.
    NotRunning,
}

/// A spawned agent process owned by the caller.
#[async_trait]
pub trait AgentProcess: Send {
    /// Returns the OS process id.
    fn pid(&self) -> ProcessId;

    /// Waits for the process to exit.
    async fn wait(&mut self) -> Result<AgentExit, AgentHostError>;

    /// Kills the process and reaps it.
    async fn kill(&mut self) -> Result<(), AgentHostError>;
}

/// Spawns agent processes and queries the OS process table.
#[async_trait]
pub trait AgentProcessHost: Send + Sync {
    /// Starts the agent command.
    ///
    /// # Errors
    ///
    /// Returns [`AgentHostError::Spawn`] when the process cannot start or no
    /// pid is assigned.
    async fn spawn(&self, spec: &AgentLaunchSpec) -> Result<Box<dyn AgentProcess>, AgentHostError>;

    /// Returns whether a live process with exactly this id exists.
    fn is_running(&self, pid: ProcessId) -> bool;

    /// Requests termination of `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentHostError::Signal`] when the request is refused.
    fn terminate(&self, pid: ProcessId) -> Result<TerminateOutcome, AgentHostError>;
}

/// Errors returned by agent process hosts.
#[derive(Debug, Clone, Error)]
pub enum AgentHostError {
    /// The process could not be started.
    #[error("failed to start agent: {0}")]
    Spawn(Arc<dyn std::error::Error + Send + Sync>),

    /// Waiting on or killing the process failed.
    #[error("failed to wait for agent: {0}")]
    Wait(Arc<dyn std::error::Error + Send + Sync>),

    /// A signal could not be delivered.
    #[error("failed to signal agent: {0}")]
    Signal(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentHostError {
    /// Wraps a spawn failure.
    pub fn spawn(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Spawn(Arc::new(err))
    }

    /// Wraps a wait failure.
    pub fn wait(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Wait(Arc::new(err))
    }

    /// Wraps a signal failure.
    pub fn signal(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Signal(Arc::new(err))
    }
}
