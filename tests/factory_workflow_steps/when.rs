//! When steps for the gate-checked branch workflow scenarios.

use super::world::{FactoryWorld, run_async};
use crate::test_helpers::{Factory, REPO, commit_file};
use gantry::branch::services::{CreateBranchRequest, MergeOptions};
use rstest_bdd_macros::when;

#[when(r#"branch "{name}" is created for task "{slug}""#)]
fn create_branch_for_task(
    world: &mut FactoryWorld,
    name: String,
    slug: String,
) -> Result<(), eyre::Report> {
    let request = CreateBranchRequest::new(REPO, name).with_task(slug);
    let result = run_async(world.factory()?.branches.create(request));
    world.last_create = Some(result);
    Ok(())
}

#[when(r#"the gates run on branch "{name}""#)]
fn run_gates(world: &mut FactoryWorld, name: String) -> Result<(), eyre::Report> {
    let key = Factory::key(&name)?;
    run_async(world.factory()?.branches.run_gates(&key, None))?;
    Ok(())
}

#[when(r#"branch "{name}" is merged"#)]
fn merge_branch(world: &mut FactoryWorld, name: String) -> Result<(), eyre::Report> {
    let key = Factory::key(&name)?;
    let result = run_async(
        world
            .factory()?
            .branches
            .merge(&key, MergeOptions::default()),
    );
    world.last_merge = Some(result);
    Ok(())
}

#[when(r#"the file "{file}" is committed on branch "{name}""#)]
fn commit_on_branch(world: &mut FactoryWorld, file: String, name: String) -> Result<(), eyre::Report> {
    let checkout = world.factory()?.checkout(&name);
    commit_file(&checkout, &file, "fixed\n", "fix the failing gate")?;
    Ok(())
}
