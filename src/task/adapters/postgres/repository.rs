//! `PostgreSQL` repository implementation for task storage.

use super::{models::TaskRow, schema::tasks};
use crate::task::{
    domain::{PersistedTaskData, Priority, Task, TaskKey, TaskStatus},
    ports::{TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<()> {
        let key = task.key().clone();
        let row = to_row(task);
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::Duplicate(key.clone())
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let key = task.key().clone();
        let status = task.status().as_str().to_owned();
        let updated_at = task.updated_at();
        self.run_blocking(move |connection| {
            let affected = diesel::update(
                tasks::table
                    .filter(tasks::repo.eq(key.repo().as_str()))
                    .filter(tasks::slug.eq(key.slug().as_str())),
            )
            .set((tasks::status.eq(status), tasks::updated_at.eq(updated_at)))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if affected == 0 {
                return Err(TaskRepositoryError::NotFound(key));
            }
            Ok(())
        })
        .await
    }

    async fn find(&self, key: &TaskKey) -> TaskRepositoryResult<Option<Task>> {
        let lookup = key.clone();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::repo.eq(lookup.repo().as_str()))
                .filter(tasks::slug.eq(lookup.slug().as_str()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let repo = filter.repo.as_ref().map(|repo| repo.as_str().to_owned());
        let status = filter.status.map(|status| status.as_str().to_owned());
        self.run_blocking(move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(repo) = repo {
                query = query.filter(tasks::repo.eq(repo));
            }
            if let Some(status) = status {
                query = query.filter(tasks::status.eq(status));
            }
            query
                .order((tasks::priority.asc(), tasks::repo.asc(), tasks::slug.asc()))
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }
}

fn to_row(task: &Task) -> TaskRow {
    TaskRow {
        repo: task.key().repo().as_str().to_owned(),
        slug: task.key().slug().as_str().to_owned(),
        title: task.title().to_owned(),
        body: task.body().to_owned(),
        priority: i16::from(task.priority().value()),
        status: task.status().as_str().to_owned(),
        depends_on: task.depends_on().iter().map(ToString::to_string).collect(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let key = TaskKey::from_parts(&row.repo, &row.slug).map_err(TaskRepositoryError::persistence)?;
    let priority = Priority::new(i64::from(row.priority)).map_err(TaskRepositoryError::persistence)?;
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let depends_on = row
        .depends_on
        .iter()
        .map(|reference| reference.parse::<TaskKey>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        key,
        title: row.title,
        body: row.body,
        priority,
        status,
        depends_on,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
