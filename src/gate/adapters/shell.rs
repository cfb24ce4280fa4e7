//! `GateExecutor` that runs gate commands through `sh -c`.

use crate::gate::{
    domain::GateOutcome,
    ports::{GateExecutionError, GateExecutor, GateInvocation},
};
use crate::shell::shell_command;
use async_trait::async_trait;
use std::process::Stdio;
use tracing::{debug, instrument, warn};

/// Runs gate commands as shell subprocesses, writing stdout and stderr to the
/// same log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellGateExecutor;

impl ShellGateExecutor {
    /// Creates the executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GateExecutor for ShellGateExecutor {
    #[instrument(skip_all, fields(working_dir = %invocation.working_dir))]
    async fn execute(&self, invocation: GateInvocation) -> Result<GateOutcome, GateExecutionError> {
        let GateInvocation {
            command,
            working_dir,
            log,
            timeout,
        } = invocation;
        let stderr_log = log.try_clone().map_err(GateExecutionError::spawn)?;

        let mut child = shell_command(&command, &working_dir)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr_log))
            .spawn()
            .map_err(GateExecutionError::spawn)?;
        debug!(pid = ?child.id(), "gate command started");

        let waited = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "gate command timed out, killing");
                    child.kill().await.map_err(GateExecutionError::wait)?;
                    return Ok(GateOutcome::TimedOut);
                }
            },
            None => child.wait().await,
        };
        let status = waited.map_err(GateExecutionError::wait)?;
        debug!(exit_code = ?status.code(), "gate command finished");
        Ok(status
            .code()
            .map_or(GateOutcome::Terminated, GateOutcome::Exited))
    }
}
