//! Branch store updates, filters and foreign keys against `PostgreSQL`.

use crate::postgres::helpers::{REPO, TestDatabase, stored};
use eyre::{Result, bail, ensure};
use gantry::branch::{
    adapters::postgres::PostgresBranchRepository,
    domain::{BranchStatus, Revision},
    ports::{BranchFilter, BranchRepository, BranchRepositoryError},
};
use gantry::repo::domain::RepoName;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn merge_update_replaces_the_mutable_fields(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "branch_update")?;
    let branches = PostgresBranchRepository::new(db.pool.clone());
    db.register_repo()?;
    let task = db.add_task("fix-1", &[])?;
    let mut branch = db.add_branch("fix-1-branch", Some(task.key()))?;

    let head = Revision::new("3333333333333333333333333333333333333333")?;
    branch.mark_merged(head.clone(), &DefaultClock)?;
    db.rt.block_on(branches.update(&branch))?;

    let Some(found) = db.rt.block_on(branches.find(branch.key()))? else {
        bail!("branch {} vanished after update", branch.key());
    };
    ensure!(found.status() == BranchStatus::Merged);
    ensure!(found.head_rev() == Some(&head));
    ensure!(found.base_rev() == branch.base_rev());
    ensure!(found.task() == Some(task.key()));
    ensure!(found.environment() == branch.environment());
    ensure!(found.merged_at() == branch.merged_at().map(stored));
    ensure!(found.updated_at() == stored(branch.updated_at()));
    ensure!(found.created_at() == stored(branch.created_at()));
    Ok(())
}

#[rstest]
fn slash_names_round_trip_and_filter_by_status(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "branch_filter")?;
    let branches = PostgresBranchRepository::new(db.pool.clone());
    db.register_repo()?;
    db.add_branch("feat", None)?;
    let mut nested = db.add_branch("feat/x", None)?;
    nested.mark_abandoned(&DefaultClock)?;
    db.rt.block_on(branches.update(&nested))?;

    let Some(found) = db.rt.block_on(branches.find(nested.key()))? else {
        bail!("nested branch was not found");
    };
    ensure!(found.key().name().as_str() == "feat/x");
    ensure!(found.environment().path().as_str() == "/srv/envs/acme/widgets/feat%2Fx");
    ensure!(found.task().is_none());

    let active = db.rt.block_on(
        branches.list(&BranchFilter::default().with_status(BranchStatus::Active)),
    )?;
    let names: Vec<&str> = active.iter().map(|branch| branch.key().name().as_str()).collect();
    ensure!(names == ["feat"], "active branches {names:?}");
    let all = db
        .rt
        .block_on(branches.list(&BranchFilter::default().in_repo(RepoName::new(REPO)?)))?;
    let all_names: Vec<&str> = all.iter().map(|branch| branch.key().name().as_str()).collect();
    ensure!(all_names == ["feat", "feat/x"], "branches {all_names:?}");
    Ok(())
}

#[rstest]
fn store_errors_are_classified(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "branch_errors")?;
    let branches = PostgresBranchRepository::new(db.pool.clone());

    let orphan = db.add_branch("orphan", None);
    ensure!(
        orphan.is_err(),
        "a branch of an unregistered repository must violate the foreign key"
    );

    db.register_repo()?;
    let branch = db.add_branch("fix-1-branch", None)?;
    let duplicate = db.rt.block_on(branches.insert(&branch));
    ensure!(
        matches!(&duplicate, Err(BranchRepositoryError::Duplicate(key)) if key == branch.key()),
        "unexpected insert result {duplicate:?}"
    );

    let mut deleted = db.add_branch("deleted", None)?;
    db.execute("DELETE FROM branches WHERE name = 'deleted'")?;
    deleted.mark_abandoned(&DefaultClock)?;
    let update = db.rt.block_on(branches.update(&deleted));
    ensure!(
        matches!(&update, Err(BranchRepositoryError::NotFound(key)) if key == deleted.key()),
        "unexpected update result {update:?}"
    );
    Ok(())
}
