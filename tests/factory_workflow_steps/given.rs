//! Given steps for the gate-checked branch workflow scenarios.

use super::world::{FactoryWorld, run_async};
use crate::test_helpers::{Factory, REPO, require_git};
use gantry::task::services::CreateTaskRequest;
use rstest_bdd_macros::given;

#[given(r#"a repository whose master declares gate "{gate}" running "{command}""#)]
fn repository_with_gate(
    world: &mut FactoryWorld,
    gate: String,
    command: String,
) -> Result<(), eyre::Report> {
    require_git()?;
    world.factory = Some(run_async(Factory::new(&[(&gate, &command)], ""))?);
    Ok(())
}

#[given(r#"a task "{slug}" with no dependencies"#)]
fn task_without_dependencies(world: &mut FactoryWorld, slug: String) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(REPO, slug.as_str(), format!("Work on {slug}"));
    run_async(world.factory()?.tasks.create(request))?;
    Ok(())
}

#[given(r#"a task "{slug}" depending on "{dependency}""#)]
fn task_with_dependency(
    world: &mut FactoryWorld,
    slug: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(REPO, slug.as_str(), format!("Work on {slug}"))
        .with_depends_on([dependency]);
    run_async(world.factory()?.tasks.create(request))?;
    Ok(())
}
