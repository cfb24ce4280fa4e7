//! Spawns, reaps and kills agent sessions.

use super::LaunchAgentRequest;
use crate::agent::{
    domain::{
        AgentDomainError, AgentSession, AgentSessionId, AgentType, NewAgentSession, ProcessId,
    },
    ports::{
        AgentHostError, AgentLaunchSpec, AgentProcess, AgentProcessHost, AgentSessionRepository,
        AgentSessionRepositoryError, TerminateOutcome,
    },
};
use crate::branch::domain::BranchKey;
use crate::config::AgentCommandTemplate;
use crate::error::ErrorKind;
use crate::events::{EventSink, FactoryEvent};
use crate::shell::shell_escape;
use minijinja::Environment;
use mockable::Clock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Service-level errors for agent sessions.
#[derive(Debug, Error)]
pub enum AgentSessionServiceError {
    /// Domain validation or transition failed.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AgentSessionRepositoryError),

    /// The process host failed.
    #[error(transparent)]
    Host(#[from] AgentHostError),

    /// No command template is configured for the agent type.
    #[error("unknown agent type '{0}'")]
    UnknownAgentType(String),

    /// The command template could not be rendered.
    #[error("failed to render command for agent '{agent_type}': {reason}")]
    Template {
        /// Agent type whose template failed.
        agent_type: AgentType,
        /// Renderer message.
        reason: String,
    },

    /// No session exists with the given id.
    #[error("agent session {0} not found")]
    NotFound(AgentSessionId),
}

impl AgentSessionServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Template { .. } => ErrorKind::PreconditionFailed,
            Self::UnknownAgentType(_)
            | Self::NotFound(_)
            | Self::Repository(AgentSessionRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(_) | Self::Host(_) => ErrorKind::ExternalToolFailure,
        }
    }
}

/// Result type for agent session service operations.
pub type AgentSessionServiceResult<T> = Result<T, AgentSessionServiceError>;

/// A session whose process is running and must be reaped with
/// [`AgentSessionService::wait`].
pub struct RunningAgent {
    session: AgentSession,
    process: Box<dyn AgentProcess>,
}

impl RunningAgent {
    /// Returns the session as recorded at spawn.
    #[must_use]
    pub const fn session(&self) -> &AgentSession {
        &self.session
    }
}

/// Agent session manager.
pub struct AgentSessionService<C>
where
    C: Clock + Send + Sync,
{
    sessions: Arc<dyn AgentSessionRepository>,
    host: Arc<dyn AgentProcessHost>,
    templates: Arc<BTreeMap<String, AgentCommandTemplate>>,
    events: Arc<dyn EventSink>,
    timeout: Option<Duration>,
    clock: Arc<C>,
}

impl<C> Clone for AgentSessionService<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            host: Arc::clone(&self.host),
            templates: Arc::clone(&self.templates),
            events: Arc::clone(&self.events),
            timeout: self.timeout,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> AgentSessionService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a session manager with the given agent command templates.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn AgentSessionRepository>,
        host: Arc<dyn AgentProcessHost>,
        templates: BTreeMap<String, AgentCommandTemplate>,
        events: Arc<dyn EventSink>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            sessions,
            host,
            templates: Arc::new(templates),
            events,
            timeout: None,
            clock,
        }
    }

    /// Kills agents that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Records a `created` session, starts the agent, then records the pid
    /// as `running`.
    ///
    /// A process that cannot start leaves the session `created` without a
    /// pid.
    ///
    /// # Errors
    ///
    /// Returns [`AgentSessionServiceError::UnknownAgentType`] when no
    /// template is configured and [`AgentSessionServiceError::Host`] when
    /// the process cannot start.
    #[instrument(skip_all, fields(branch = %request.branch, agent_type = %request.agent_type))]
    pub async fn spawn(&self, request: LaunchAgentRequest) -> AgentSessionServiceResult<RunningAgent> {
        let template = self
            .templates
            .get(request.agent_type.trim())
            .ok_or_else(|| AgentSessionServiceError::UnknownAgentType(request.agent_type.clone()))?;
        let agent_type = AgentType::new(request.agent_type.as_str())?;
        let command = render_command(&agent_type, template, &request)?;

        let mut session = AgentSession::new(
            NewAgentSession {
                branch: request.branch,
                agent_type,
                prompt: request.prompt,
            },
            &*self.clock,
        )?;
        self.sessions.insert(&session).await?;

        let process = self
            .host
            .spawn(&AgentLaunchSpec {
                command,
                working_dir: request.checkout,
            })
            .await?;
        let pid = process.pid();
        session.mark_running(pid)?;
        self.sessions.update(&session).await?;
        info!(session = %session.id(), pid = %pid, "agent started");
        self.events.publish(&FactoryEvent::AgentStarted {
            session: session.id(),
            branch: session.branch().clone(),
            pid: pid.value(),
        });
        Ok(RunningAgent { session, process })
    }

    /// Blocks until the agent exits and records the terminal status.
    ///
    /// A session that was killed while waiting keeps its stored status.
    ///
    /// # Errors
    ///
    /// Returns host or repository errors.
    #[instrument(skip_all, fields(session = %running.session.id()))]
    pub async fn wait(&self, running: RunningAgent) -> AgentSessionServiceResult<AgentSession> {
        let RunningAgent {
            session,
            mut process,
        } = running;

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, process.wait()).await {
                Ok(exit) => Some(exit?),
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "agent timed out, killing");
                    process.kill().await?;
                    None
                }
            },
            None => Some(process.wait().await?),
        };

        let mut current = self
            .sessions
            .find(session.id())
            .await?
            .ok_or(AgentSessionServiceError::NotFound(session.id()))?;
        if current.status().is_terminal() {
            debug!(status = %current.status(), "session already terminal");
            return Ok(current);
        }
        match outcome {
            Some(exit) => current.mark_exited(exit.code, &*self.clock)?,
            None => current.mark_killed(&*self.clock)?,
        }
        self.sessions.update(&current).await?;
        self.publish_finished(&current);
        Ok(current)
    }

    /// Retrieves a session.
    ///
    /// # Errors
    ///
    /// Returns [`AgentSessionServiceError::NotFound`] when missing.
    pub async fn get(&self, id: AgentSessionId) -> AgentSessionServiceResult<AgentSession> {
        self.sessions
            .find(id)
            .await?
            .ok_or(AgentSessionServiceError::NotFound(id))
    }

    /// Lists sessions recorded for a branch.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_for_branch(
        &self,
        branch: &BranchKey,
    ) -> AgentSessionServiceResult<Vec<AgentSession>> {
        Ok(self.sessions.list_for_branch(branch).await?)
    }

    /// Returns whether a live OS process has this pid.
    #[must_use]
    pub fn is_running(&self, pid: ProcessId) -> bool {
        self.host.is_running(pid)
    }

    /// Terminates the session's process and records it as failed with exit
    /// code `-1`.
    ///
    /// Killing a session whose process is gone, or that is already terminal,
    /// changes nothing and succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::NoProcess`] when no pid was recorded and
    /// [`AgentSessionServiceError::Host`] when the signal is refused.
    #[instrument(skip_all, fields(session = %id))]
    pub async fn kill(&self, id: AgentSessionId) -> AgentSessionServiceResult<AgentSession> {
        let mut session = self.get(id).await?;
        let pid = session.pid().ok_or(AgentDomainError::NoProcess(id))?;
        if session.status().is_terminal() || !self.host.is_running(pid) {
            debug!(pid = %pid, status = %session.status(), "agent not running; nothing to kill");
            return Ok(session);
        }
        if self.host.terminate(pid)? == TerminateOutcome::NotRunning {
            debug!(pid = %pid, "agent exited before the signal");
            return Ok(session);
        }
        session.mark_killed(&*self.clock)?;
        self.sessions.update(&session).await?;
        info!(pid = %pid, "agent killed");
        self.publish_finished(&session);
        Ok(session)
    }

    /// Records that the agent asked for human help.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::InvalidTransition`] unless the session is
    /// running.
    pub async fn request_help(&self, id: AgentSessionId) -> AgentSessionServiceResult<AgentSession> {
        let mut session = self.get(id).await?;
        session.request_help()?;
        self.sessions.update(&session).await?;
        info!(session = %id, "agent requested help");
        Ok(session)
    }

    fn publish_finished(&self, session: &AgentSession) {
        self.events.publish(&FactoryEvent::AgentFinished {
            session: session.id(),
            status: session.status(),
            exit_code: session.exit_code(),
        });
    }
}

fn render_command(
    agent_type: &AgentType,
    template: &AgentCommandTemplate,
    request: &LaunchAgentRequest,
) -> AgentSessionServiceResult<String> {
    let mut context = Map::new();
    for (key, value) in [
        ("prompt", request.prompt.as_str()),
        ("repo", request.branch.repo().as_str()),
        ("branch", request.branch.name().as_str()),
        ("checkout", request.checkout.as_str()),
    ] {
        context.insert(key.to_owned(), Value::String(shell_escape(value)));
    }
    Environment::new()
        .render_str(&template.command, context)
        .map_err(|error| AgentSessionServiceError::Template {
            agent_type: agent_type.clone(),
            reason: error.to_string(),
        })
}
