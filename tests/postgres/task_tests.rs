//! Task store round-trips against `PostgreSQL`.

use crate::postgres::helpers::{REPO, TestDatabase, new_task, stored};
use eyre::{Result, bail, ensure};
use gantry::repo::domain::RepoName;
use gantry::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{TaskKey, TaskStatus},
    ports::{TaskFilter, TaskRepository, TaskRepositoryError},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn task_round_trips_with_dependencies(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_round_trip")?;
    let tasks = PostgresTaskRepository::new(db.pool.clone());
    let task = new_task("fix-2", &["fix-1", "docs"])?;

    db.rt.block_on(tasks.insert(&task))?;
    let Some(found) = db.rt.block_on(tasks.find(task.key()))? else {
        bail!("stored task {} was not found", task.key());
    };

    ensure!(found.key() == task.key());
    ensure!(found.title() == "Work on fix-2");
    ensure!(found.body() == "Details for fix-2");
    ensure!(found.priority() == task.priority());
    ensure!(found.status() == TaskStatus::Open);
    ensure!(
        found.depends_on() == [TaskKey::from_parts(REPO, "fix-1")?, TaskKey::from_parts(REPO, "docs")?],
        "dependency order changed: {:?}",
        found.depends_on()
    );
    ensure!(found.created_at() == stored(task.created_at()));
    ensure!(found.updated_at() == stored(task.updated_at()));
    Ok(())
}

#[rstest]
fn status_update_is_persisted_and_filterable(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_update")?;
    let tasks = PostgresTaskRepository::new(db.pool.clone());
    let mut claimed = db.add_task("fix-1", &[])?;
    db.add_task("fix-2", &[])?;

    claimed.transition_to(TaskStatus::InProgress, &DefaultClock)?;
    db.rt.block_on(tasks.update(&claimed))?;

    let Some(found) = db.rt.block_on(tasks.find(claimed.key()))? else {
        bail!("updated task vanished");
    };
    ensure!(found.status() == TaskStatus::InProgress);
    ensure!(found.updated_at() == stored(claimed.updated_at()));

    let in_progress = db.rt.block_on(
        tasks.list(&TaskFilter::default().with_status(TaskStatus::InProgress)),
    )?;
    ensure!(in_progress.iter().map(|task| task.key()).eq([claimed.key()]));
    let in_repo = db
        .rt
        .block_on(tasks.list(&TaskFilter::default().in_repo(RepoName::new(REPO)?)))?;
    ensure!(in_repo.len() == 2);
    let elsewhere = db
        .rt
        .block_on(tasks.list(&TaskFilter::default().in_repo(RepoName::new("acme/other")?)))?;
    ensure!(elsewhere.is_empty());
    Ok(())
}

#[rstest]
fn duplicate_and_missing_tasks_are_reported(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "task_errors")?;
    let tasks = PostgresTaskRepository::new(db.pool.clone());
    let task = db.add_task("fix-1", &[])?;

    let duplicate = db.rt.block_on(tasks.insert(&task));
    ensure!(
        matches!(&duplicate, Err(TaskRepositoryError::Duplicate(key)) if key == task.key()),
        "unexpected insert result {duplicate:?}"
    );

    let unsaved = new_task("never-stored", &[])?;
    let missing = db.rt.block_on(tasks.update(&unsaved));
    ensure!(
        matches!(&missing, Err(TaskRepositoryError::NotFound(key)) if key == unsaved.key()),
        "unexpected update result {missing:?}"
    );
    ensure!(db.rt.block_on(tasks.find(unsaved.key()))?.is_none());
    Ok(())
}
