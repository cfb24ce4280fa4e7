//! Gate command execution contract.

use crate::gate::domain::GateOutcome;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A gate command ready to run.
#[derive(Debug)]
pub struct GateInvocation {
    /// Shell command.
    pub command: String,
    /// Directory the command runs in.
    pub working_dir: Utf8PathBuf,
    /// Log file receiving both stdout and stderr.
    pub log: File,
    /// Optional deadline after which the process is killed.
    pub timeout: Option<Duration>,
}

/// Runs gate commands.
#[async_trait]
pub trait GateExecutor: Send + Sync {
    /// Runs `invocation` to completion.
    ///
    /// A non-zero exit is an outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GateExecutionError::Spawn`] when the process cannot be
    /// started.
    async fn execute(&self, invocation: GateInvocation) -> Result<GateOutcome, GateExecutionError>;
}

/// Errors returned by gate executors.
#[derive(Debug, Clone, Error)]
pub enum GateExecutionError {
    /// The command could not be started.
    #[error("failed to start gate command: {0}")]
    Spawn(Arc<dyn std::error::Error + Send + Sync>),

    /// The process started but its exit could not be observed.
    #[error("failed to wait for gate command: {0}")]
    Wait(Arc<dyn std::error::Error + Send + Sync>),
}

impl GateExecutionError {
    /// Wraps a spawn failure.
    pub fn spawn(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Spawn(Arc::new(err))
    }

    /// Wraps a wait failure.
    pub fn wait(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Wait(Arc::new(err))
    }
}
