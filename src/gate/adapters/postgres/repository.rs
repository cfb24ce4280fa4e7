//! `PostgreSQL` repository implementation for gate run history.

use super::{
    models::{GateRunRow, NewGateRunRow},
    schema::gate_runs,
};
use crate::branch::domain::{BranchKey, Revision};
use crate::gate::{
    domain::{
        GateName, GateRun, GateRunId, GateRunStatus, NewGateRun, PersistedGateRunData,
    },
    ports::{GateRunRepository, GateRunRepositoryError, GateRunRepositoryResult},
};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by gate adapters.
pub type GateRunPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed gate run repository.
#[derive(Debug, Clone)]
pub struct PostgresGateRunRepository {
    pool: GateRunPgPool,
}

impl PostgresGateRunRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: GateRunPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> GateRunRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> GateRunRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(GateRunRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(GateRunRepositoryError::persistence)?
    }
}

#[async_trait]
impl GateRunRepository for PostgresGateRunRepository {
    async fn insert(&self, run: NewGateRun) -> GateRunRepositoryResult<GateRun> {
        let row = NewGateRunRow {
            branch_repo: run.branch.repo().as_str().to_owned(),
            branch_name: run.branch.name().as_str().to_owned(),
            gate_name: run.gate.as_str().to_owned(),
            rev: run.rev.as_str().to_owned(),
            status: GateRunStatus::Running.as_str().to_owned(),
            started_at: run.started_at,
            log_path: run.log_path.as_str().to_owned(),
        };
        let id = self
            .run_blocking(move |connection| {
                diesel::insert_into(gate_runs::table)
                    .values(&row)
                    .returning(gate_runs::id)
                    .get_result::<i64>(connection)
                    .map_err(GateRunRepositoryError::persistence)
            })
            .await?;
        Ok(GateRun::started(GateRunId::new(id), run))
    }

    async fn finish(&self, run: &GateRun) -> GateRunRepositoryResult<()> {
        let id = run.id();
        let status = run.status().as_str().to_owned();
        let finished_at = run.finished_at();
        let exit_code = run.exit_code();
        self.run_blocking(move |connection| {
            let affected = diesel::update(
                gate_runs::table
                    .filter(gate_runs::id.eq(id.value()))
                    .filter(gate_runs::status.eq(GateRunStatus::Running.as_str())),
            )
            .set((
                gate_runs::status.eq(status),
                gate_runs::finished_at.eq(finished_at),
                gate_runs::exit_code.eq(exit_code),
            ))
            .execute(connection)
            .map_err(GateRunRepositoryError::persistence)?;
            if affected == 0 {
                return Err(GateRunRepositoryError::NotRunning(id));
            }
            Ok(())
        })
        .await
    }

    async fn find(&self, id: GateRunId) -> GateRunRepositoryResult<Option<GateRun>> {
        self.run_blocking(move |connection| {
            let row = gate_runs::table
                .filter(gate_runs::id.eq(id.value()))
                .select(GateRunRow::as_select())
                .first::<GateRunRow>(connection)
                .optional()
                .map_err(GateRunRepositoryError::persistence)?;
            row.map(row_to_run).transpose()
        })
        .await
    }

    async fn latest(
        &self,
        branch: &BranchKey,
        gate: &GateName,
    ) -> GateRunRepositoryResult<Option<GateRun>> {
        let lookup = branch.clone();
        let gate_name = gate.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = gate_runs::table
                .filter(gate_runs::branch_repo.eq(lookup.repo().as_str()))
                .filter(gate_runs::branch_name.eq(lookup.name().as_str()))
                .filter(gate_runs::gate_name.eq(gate_name))
                .order(gate_runs::id.desc())
                .select(GateRunRow::as_select())
                .first::<GateRunRow>(connection)
                .optional()
                .map_err(GateRunRepositoryError::persistence)?;
            row.map(row_to_run).transpose()
        })
        .await
    }

    async fn list_for_branch(&self, branch: &BranchKey) -> GateRunRepositoryResult<Vec<GateRun>> {
        let lookup = branch.clone();
        self.run_blocking(move |connection| {
            gate_runs::table
                .filter(gate_runs::branch_repo.eq(lookup.repo().as_str()))
                .filter(gate_runs::branch_name.eq(lookup.name().as_str()))
                .order(gate_runs::id.asc())
                .select(GateRunRow::as_select())
                .load::<GateRunRow>(connection)
                .map_err(GateRunRepositoryError::persistence)?
                .into_iter()
                .map(row_to_run)
                .collect()
        })
        .await
    }
}

fn row_to_run(row: GateRunRow) -> GateRunRepositoryResult<GateRun> {
    let branch = BranchKey::from_parts(&row.branch_repo, &row.branch_name)
        .map_err(GateRunRepositoryError::persistence)?;
    let gate = GateName::new(row.gate_name).map_err(GateRunRepositoryError::persistence)?;
    let rev = Revision::new(row.rev).map_err(GateRunRepositoryError::persistence)?;
    let status =
        GateRunStatus::try_from(row.status.as_str()).map_err(GateRunRepositoryError::persistence)?;

    Ok(GateRun::from_persisted(PersistedGateRunData {
        id: GateRunId::new(row.id),
        branch,
        gate,
        rev,
        status,
        started_at: row.started_at,
        finished_at: row.finished_at,
        exit_code: row.exit_code,
        log_path: Utf8PathBuf::from(row.log_path),
    }))
}
