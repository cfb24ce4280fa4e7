//! `PostgreSQL` implementation of the repository registry.

use super::{models::RepositoryRow, schema::repositories};
use crate::repo::{
    domain::{PersistedRepositoryData, RepoName, Repository},
    ports::{RepositoryStore, RepositoryStoreError, RepositoryStoreResult},
};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the registry adapter.
pub type RepoPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed repository registry.
#[derive(Debug, Clone)]
pub struct PostgresRepositoryStore {
    pool: RepoPgPool,
}

impl PostgresRepositoryStore {
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: RepoPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> RepositoryStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RepositoryStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RepositoryStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RepositoryStoreError::persistence)?
    }
}

#[async_trait]
impl RepositoryStore for PostgresRepositoryStore {
    async fn insert(&self, repository: &Repository) -> RepositoryStoreResult<()> {
        let name = repository.name().clone();
        let row = RepositoryRow {
            name: name.as_str().to_owned(),
            path: repository.path().as_str().to_owned(),
            created_at: repository.created_at(),
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(repositories::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RepositoryStoreError::Duplicate(name.clone())
                    }
                    _ => RepositoryStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find(&self, name: &RepoName) -> RepositoryStoreResult<Option<Repository>> {
        let lookup = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = repositories::table
                .filter(repositories::name.eq(lookup))
                .select(RepositoryRow::as_select())
                .first::<RepositoryRow>(connection)
                .optional()
                .map_err(RepositoryStoreError::persistence)?;
            row.map(row_to_repository).transpose()
        })
        .await
    }

    async fn list(&self) -> RepositoryStoreResult<Vec<Repository>> {
        self.run_blocking(move |connection| {
            repositories::table
                .order(repositories::name.asc())
                .select(RepositoryRow::as_select())
                .load::<RepositoryRow>(connection)
                .map_err(RepositoryStoreError::persistence)?
                .into_iter()
                .map(row_to_repository)
                .collect()
        })
        .await
    }
}

fn row_to_repository(row: RepositoryRow) -> RepositoryStoreResult<Repository> {
    let name = RepoName::new(row.name).map_err(RepositoryStoreError::persistence)?;
    Ok(Repository::from_persisted(PersistedRepositoryData {
        name,
        path: Utf8PathBuf::from(row.path),
        created_at: row.created_at,
    }))
}
