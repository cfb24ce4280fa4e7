//! Agent process host backed by the operating system.

use crate::agent::{
    domain::ProcessId,
    ports::{
        AgentExit, AgentHostError, AgentLaunchSpec, AgentProcess, AgentProcessHost,
        TerminateOutcome,
    },
};
use crate::shell::shell_command;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Child;
use tracing::{debug, instrument};

/// Spawns agents through `sh -c` and inspects processes with POSIX signals.
///
/// Agent output is inherited from the calling process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsAgentProcessHost;

impl OsAgentProcessHost {
    /// Creates the process host.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

struct OsAgentProcess {
    pid: ProcessId,
    child: Child,
}

#[async_trait]
impl AgentProcess for OsAgentProcess {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    async fn wait(&mut self) -> Result<AgentExit, AgentHostError> {
        let status = self.child.wait().await.map_err(AgentHostError::wait)?;
        Ok(AgentExit {
            code: status.code(),
        })
    }

    async fn kill(&mut self) -> Result<(), AgentHostError> {
        self.child.kill().await.map_err(AgentHostError::wait)
    }
}

#[async_trait]
impl AgentProcessHost for OsAgentProcessHost {
    #[instrument(skip_all, fields(working_dir = %spec.working_dir))]
    async fn spawn(&self, spec: &AgentLaunchSpec) -> Result<Box<dyn AgentProcess>, AgentHostError> {
        let child = shell_command(&spec.command, &spec.working_dir)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(AgentHostError::spawn)?;
        let pid = child
            .id()
            .map(ProcessId::new)
            .ok_or_else(|| {
                AgentHostError::spawn(std::io::Error::other(
                    "agent exited before a pid was assigned",
                ))
            })?;
        debug!(pid = %pid, "agent process started");
        Ok(Box::new(OsAgentProcess { pid, child }))
    }

    fn is_running(&self, pid: ProcessId) -> bool {
        os::is_running(pid)
    }

    fn terminate(&self, pid: ProcessId) -> Result<TerminateOutcome, AgentHostError> {
        os::terminate(pid)
    }
}

#[cfg(unix)]
mod os {
    use super::{AgentHostError, ProcessId, TerminateOutcome};
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    fn to_pid(pid: ProcessId) -> Option<Pid> {
        i32::try_from(pid.value())
            .ok()
            .filter(|raw| *raw > 0)
            .map(Pid::from_raw)
    }

    pub(super) fn is_running(pid: ProcessId) -> bool {
        to_pid(pid).is_some_and(|target| match kill(target, None) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => false,
        })
    }

    pub(super) fn terminate(pid: ProcessId) -> Result<TerminateOutcome, AgentHostError> {
        let Some(target) = to_pid(pid) else {
            return Ok(TerminateOutcome::NotRunning);
        };
        match kill(target, Signal::SIGTERM) {
            Ok(()) => Ok(TerminateOutcome::Signalled),
            Err(Errno::ESRCH) => Ok(TerminateOutcome::NotRunning),
            Err(err) => Err(AgentHostError::signal(err)),
        }
    }
}

#[cfg(not(unix))]
mod os {
    use super::{AgentHostError, ProcessId, TerminateOutcome};

    pub(super) const fn is_running(_pid: ProcessId) -> bool {
        false
    }

    pub(super) fn terminate(_pid: ProcessId) -> Result<TerminateOutcome, AgentHostError> {
        Err(AgentHostError::signal(std::io::Error::other(
            "process signals are only supported on unix",
        )))
    }
}
