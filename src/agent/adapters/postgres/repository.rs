//! `PostgreSQL` repository implementation for agent sessions.

use super::{models::AgentSessionRow, schema::agent_sessions};
use crate::agent::{
    domain::{
        AgentSession, AgentSessionId, AgentSessionStatus, AgentType, PersistedAgentSessionData,
        ProcessId,
    },
    ports::{AgentSessionRepository, AgentSessionRepositoryError, AgentSessionRepositoryResult},
};
use crate::branch::domain::BranchKey;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by agent adapters.
pub type AgentSessionPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed agent session repository.
#[derive(Debug, Clone)]
pub struct PostgresAgentSessionRepository {
    pool: AgentSessionPgPool,
}

impl PostgresAgentSessionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AgentSessionPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AgentSessionRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AgentSessionRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(AgentSessionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AgentSessionRepositoryError::persistence)?
    }
}

#[async_trait]
impl AgentSessionRepository for PostgresAgentSessionRepository {
    async fn insert(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()> {
        let id = session.id();
        let row = to_row(session);
        self.run_blocking(move |connection| {
            diesel::insert_into(agent_sessions::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AgentSessionRepositoryError::Duplicate(id)
                    }
                    _ => AgentSessionRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, session: &AgentSession) -> AgentSessionRepositoryResult<()> {
        let id = session.id();
        let pid = session.pid().map(|pid| i64::from(pid.value()));
        let status = session.status().as_str().to_owned();
        let exit_code = session.exit_code();
        let ended_at = session.ended_at();
        self.run_blocking(move |connection| {
            let affected =
                diesel::update(agent_sessions::table.filter(agent_sessions::id.eq(id.into_inner())))
                    .set((
                        agent_sessions::pid.eq(pid),
                        agent_sessions::status.eq(status),
                        agent_sessions::exit_code.eq(exit_code),
                        agent_sessions::ended_at.eq(ended_at),
                    ))
                    .execute(connection)
                    .map_err(AgentSessionRepositoryError::persistence)?;
            if affected == 0 {
                return Err(AgentSessionRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find(&self, id: AgentSessionId) -> AgentSessionRepositoryResult<Option<AgentSession>> {
        self.run_blocking(move |connection| {
            let row = agent_sessions::table
                .filter(agent_sessions::id.eq(id.into_inner()))
                .select(AgentSessionRow::as_select())
                .first::<AgentSessionRow>(connection)
                .optional()
                .map_err(AgentSessionRepositoryError::persistence)?;
            row.map(row_to_session).transpose()
        })
        .await
    }

    async fn list_for_branch(
        &self,
        branch: &BranchKey,
    ) -> AgentSessionRepositoryResult<Vec<AgentSession>> {
        let lookup = branch.clone();
        self.run_blocking(move |connection| {
            agent_sessions::table
                .filter(agent_sessions::branch_repo.eq(lookup.repo().as_str()))
                .filter(agent_sessions::branch_name.eq(lookup.name().as_str()))
                .order((agent_sessions::started_at.asc(), agent_sessions::id.asc()))
                .select(AgentSessionRow::as_select())
                .load::<AgentSessionRow>(connection)
                .map_err(AgentSessionRepositoryError::persistence)?
                .into_iter()
                .map(row_to_session)
                .collect()
        })
        .await
    }
}

fn to_row(session: &AgentSession) -> AgentSessionRow {
    AgentSessionRow {
        id: session.id().into_inner(),
        branch_repo: session.branch().repo().as_str().to_owned(),
        branch_name: session.branch().name().as_str().to_owned(),
        agent_type: session.agent_type().as_str().to_owned(),
        prompt: session.prompt().to_owned(),
        pid: session.pid().map(|pid| i64::from(pid.value())),
        status: session.status().as_str().to_owned(),
        exit_code: session.exit_code(),
        started_at: session.started_at(),
        ended_at: session.ended_at(),
    }
}

fn row_to_session(row: AgentSessionRow) -> AgentSessionRepositoryResult<AgentSession> {
    let branch = BranchKey::from_parts(&row.branch_repo, &row.branch_name)
        .map_err(AgentSessionRepositoryError::persistence)?;
    let agent_type =
        AgentType::new(row.agent_type).map_err(AgentSessionRepositoryError::persistence)?;
    let status = AgentSessionStatus::try_from(row.status.as_str())
        .map_err(AgentSessionRepositoryError::persistence)?;
    let pid = row
        .pid
        .map(u32::try_from)
        .transpose()
        .map_err(AgentSessionRepositoryError::persistence)?
        .map(ProcessId::new);

    Ok(AgentSession::from_persisted(PersistedAgentSessionData {
        id: AgentSessionId::from_uuid(row.id),
        branch,
        agent_type,
        prompt: row.prompt,
        pid,
        status,
        exit_code: row.exit_code,
        started_at: row.started_at,
        ended_at: row.ended_at,
    }))
}
