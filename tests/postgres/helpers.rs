//! Shared fixtures for `PostgreSQL` adapter tests.
//!
//! Every test gets its own database cloned from a template that already
//! carries the factory schema, and drops it again when the fixture goes out
//! of scope.

use camino::Utf8PathBuf;
use chrono::{DateTime, SubsecRound, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use eyre::{Result, WrapErr, eyre};
use gantry::branch::{
    adapters::postgres::PostgresBranchRepository,
    domain::{Branch, BranchKey, Environment, EnvironmentBackend, NewBranchData, Revision},
    ports::BranchRepository,
};
use gantry::repo::{
    adapters::postgres::PostgresRepositoryStore,
    domain::{RepoName, Repository},
    ports::RepositoryStore,
};
use gantry::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{NewTaskData, Priority, Task, TaskKey},
    ports::TaskRepository,
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Factory schema applied to the template database.
pub const CREATE_FACTORY_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_factory_tables/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "gantry_test_template";

/// Repository every fixture registers.
pub const REPO: &str = "acme/widgets";

/// Connection pool shared by every adapter under test.
pub type FactoryPgPool = Pool<ConnectionManager<PgConnection>>;

/// Ensures the template database exists with the factory schema applied.
///
/// # Errors
///
/// Returns an error when the template cannot be created or migrated.
pub fn ensure_template(cluster: &TestCluster) -> Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|err| eyre!("{err}"))?;
            conn.batch_execute(CREATE_FACTORY_TABLES_SQL)
                .map_err(|err| eyre!("apply factory schema: {err}"))?;
            Ok(())
        })
        .wrap_err("template setup")
}

/// Drops its database when the test finishes, even on panic.
pub struct CleanupGuard {
    cluster: &'static TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.db_name.as_str()) {
            tracing::warn!(database = %self.db_name, error = %err, "failed to drop test database");
        }
    }
}

/// A migrated scratch database with a runtime to drive the async adapters.
pub struct TestDatabase {
    pub pool: FactoryPgPool,
    pub rt: Runtime,
    url: String,
    _guard: CleanupGuard,
}

impl TestDatabase {
    /// Clones the template into a fresh database named after `label`.
    ///
    /// # Errors
    ///
    /// Returns an error when the database, pool or runtime cannot be built.
    pub fn create(cluster: &'static TestCluster, label: &str) -> Result<Self> {
        ensure_template(cluster)?;
        let db_name = format!("test_{label}_{}", Uuid::new_v4().simple());
        cluster
            .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
            .wrap_err_with(|| format!("create database {db_name}"))?;
        let guard = CleanupGuard {
            cluster,
            db_name: db_name.clone(),
        };
        let url = cluster.connection().database_url(&db_name);
        let pool = Pool::builder()
            .max_size(1)
            .build(ConnectionManager::<PgConnection>::new(url.clone()))
            .wrap_err("build connection pool")?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .wrap_err("build test runtime")?;
        Ok(Self {
            pool,
            rt,
            url,
            _guard: guard,
        })
    }

    /// Runs raw SQL on a dedicated connection.
    ///
    /// # Errors
    ///
    /// Returns an error carrying the database message when the statement
    /// fails.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        let mut conn = PgConnection::establish(&self.url).map_err(|err| eyre!("{err}"))?;
        diesel::sql_query(sql)
            .execute(&mut conn)
            .map_err(|err| eyre!("{err}"))
    }

    /// Registers [`REPO`] so branch rows satisfy their foreign key.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub fn register_repo(&self) -> Result<Repository> {
        let store = PostgresRepositoryStore::new(self.pool.clone());
        let repository = Repository::new(RepoName::new(REPO)?, "/srv/git/widgets.git", &DefaultClock)?;
        self.rt.block_on(store.insert(&repository))?;
        Ok(repository)
    }

    /// Stores an open task `slug` of [`REPO`].
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input or a failed insert.
    pub fn add_task(&self, slug: &str, depends_on: &[&str]) -> Result<Task> {
        let task = new_task(slug, depends_on)?;
        let tasks = PostgresTaskRepository::new(self.pool.clone());
        self.rt.block_on(tasks.insert(&task))?;
        Ok(task)
    }

    /// Stores an active branch `name` of [`REPO`], optionally linked to a task.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input or a failed insert.
    pub fn add_branch(&self, name: &str, task: Option<&TaskKey>) -> Result<Branch> {
        let key = BranchKey::from_parts(REPO, name)?;
        let branch = Branch::new(
            NewBranchData {
                base_rev: Some(Revision::new("1111111111111111111111111111111111111111")?),
                head_rev: Some(Revision::new("2222222222222222222222222222222222222222")?),
                environment: Environment::new(
                    EnvironmentBackend::Local,
                    Utf8PathBuf::from("/srv/envs/acme/widgets").join(key.name().path_segment()),
                ),
                task: task.cloned(),
                key,
            },
            &DefaultClock,
        );
        let branches = PostgresBranchRepository::new(self.pool.clone());
        self.rt.block_on(branches.insert(&branch))?;
        Ok(branch)
    }
}

/// Builds an open task of [`REPO`] without storing it.
///
/// # Errors
///
/// Returns an error for invalid slugs or references.
pub fn new_task(slug: &str, depends_on: &[&str]) -> Result<Task> {
    let dependencies = depends_on
        .iter()
        .map(|dependency| TaskKey::from_parts(REPO, dependency))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Task::new(
        NewTaskData {
            key: TaskKey::from_parts(REPO, slug)?,
            title: format!("Work on {slug}"),
            body: format!("Details for {slug}"),
            priority: Priority::new(2)?,
            depends_on: dependencies,
        },
        &DefaultClock,
    )?)
}

/// Truncates a timestamp to the microsecond precision `TIMESTAMPTZ` keeps.
#[must_use]
pub fn stored(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}
