//! `PostgreSQL` repository implementation for branch storage.

use super::{
    models::{BranchChangeset, BranchRow},
    schema::branches,
};
use crate::branch::{
    domain::{
        Branch, BranchKey, BranchStatus, Environment, EnvironmentBackend, PersistedBranchData,
        Revision,
    },
    ports::{BranchFilter, BranchRepository, BranchRepositoryError, BranchRepositoryResult},
};
use crate::task::domain::TaskKey;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by branch adapters.
pub type BranchPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed branch repository.
#[derive(Debug, Clone)]
pub struct PostgresBranchRepository {
    pool: BranchPgPool,
}

impl PostgresBranchRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BranchPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BranchRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BranchRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BranchRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BranchRepositoryError::persistence)?
    }
}

#[async_trait]
impl BranchRepository for PostgresBranchRepository {
    async fn insert(&self, branch: &Branch) -> BranchRepositoryResult<()> {
        let key = branch.key().clone();
        let row = to_row(branch);
        self.run_blocking(move |connection| {
            diesel::insert_into(branches::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BranchRepositoryError::Duplicate(key.clone())
                    }
                    _ => BranchRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, branch: &Branch) -> BranchRepositoryResult<()> {
        let key = branch.key().clone();
        let changes = BranchChangeset {
            head_rev: branch.head_rev().map(|rev| rev.as_str().to_owned()),
            status: branch.status().as_str().to_owned(),
            updated_at: branch.updated_at(),
            merged_at: branch.merged_at(),
        };
        self.run_blocking(move |connection| {
            let affected = diesel::update(
                branches::table
                    .filter(branches::repo.eq(key.repo().as_str()))
                    .filter(branches::name.eq(key.name().as_str())),
            )
            .set(&changes)
            .execute(connection)
            .map_err(BranchRepositoryError::persistence)?;
            if affected == 0 {
                return Err(BranchRepositoryError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn find(&self, key: &BranchKey) -> BranchRepositoryResult<Option<Branch>> {
        let lookup = key.clone();
        self.run_blocking(move |connection| {
            let row = branches::table
                .filter(branches::repo.eq(lookup.repo().as_str()))
                .filter(branches::name.eq(lookup.name().as_str()))
                .select(BranchRow::as_select())
                .first::<BranchRow>(connection)
                .optional()
                .map_err(BranchRepositoryError::persistence)?;
            row.map(row_to_branch).transpose()
        })
        .await
    }

    async fn list(&self, filter: &BranchFilter) -> BranchRepositoryResult<Vec<Branch>> {
        let repo = filter.repo.as_ref().map(|repo| repo.as_str().to_owned());
        let status = filter.status.map(|status| status.as_str().to_owned());
        self.run_blocking(move |connection| {
            let mut query = branches::table.select(BranchRow::as_select()).into_boxed();
            if let Some(repo) = repo {
                query = query.filter(branches::repo.eq(repo));
            }
            if let Some(status) = status {
                query = query.filter(branches::status.eq(status));
            }
            query
                .order((branches::repo.asc(), branches::name.asc()))
                .load::<BranchRow>(connection)
                .map_err(BranchRepositoryError::persistence)?
                .into_iter()
                .map(row_to_branch)
                .collect()
        })
        .await
    }
}

fn to_row(branch: &Branch) -> BranchRow {
    BranchRow {
        repo: branch.key().repo().as_str().to_owned(),
        name: branch.key().name().as_str().to_owned(),
        base_rev: branch.base_rev().map(|rev| rev.as_str().to_owned()),
        head_rev: branch.head_rev().map(|rev| rev.as_str().to_owned()),
        env_backend: branch.environment().backend().as_str().to_owned(),
        env_path: branch.environment().path().as_str().to_owned(),
        status: branch.status().as_str().to_owned(),
        task_repo: branch.task().map(|task| task.repo().as_str().to_owned()),
        task_slug: branch.task().map(|task| task.slug().as_str().to_owned()),
        created_at: branch.created_at(),
        updated_at: branch.updated_at(),
        merged_at: branch.merged_at(),
    }
}

fn parse_revision(raw: Option<String>) -> BranchRepositoryResult<Option<Revision>> {
    raw.map(Revision::new)
        .transpose()
        .map_err(BranchRepositoryError::persistence)
}

fn row_to_branch(row: BranchRow) -> BranchRepositoryResult<Branch> {
    let key =
        BranchKey::from_parts(&row.repo, &row.name).map_err(BranchRepositoryError::persistence)?;
    let status =
        BranchStatus::try_from(row.status.as_str()).map_err(BranchRepositoryError::persistence)?;
    let backend = EnvironmentBackend::try_from(row.env_backend.as_str())
        .map_err(BranchRepositoryError::persistence)?;
    let task = match (row.task_repo, row.task_slug) {
        (Some(repo), Some(slug)) => {
            Some(TaskKey::from_parts(&repo, &slug).map_err(BranchRepositoryError::persistence)?)
        }
        _ => None,
    };

    Ok(Branch::from_persisted(PersistedBranchData {
        key,
        base_rev: parse_revision(row.base_rev)?,
        head_rev: parse_revision(row.head_rev)?,
        environment: Environment::new(backend, Utf8PathBuf::from(row.env_path)),
        status,
        task,
        created_at: row.created_at,
        updated_at: row.updated_at,
        merged_at: row.merged_at,
    }))
}
