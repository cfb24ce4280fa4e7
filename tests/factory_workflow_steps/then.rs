//! Then steps for the gate-checked branch workflow scenarios.

use super::world::{FactoryWorld, run_async};
use crate::test_helpers::Factory;
use eyre::{bail, ensure};
use gantry::branch::{domain::BranchStatus, services::BranchLifecycleError};
use gantry::error::ErrorKind;
use gantry::gate::domain::GateRunStatus;
use gantry::task::domain::{TaskKey, TaskStatus};
use rstest_bdd_macros::then;

#[then(r#"task "{slug}" is "{status}""#)]
fn task_has_status(world: &mut FactoryWorld, slug: String, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())?;
    let key = TaskKey::from_parts(crate::test_helpers::REPO, &slug)?;
    let task = run_async(world.factory()?.tasks.get(&key))?;
    ensure!(
        task.status() == expected,
        "expected task {key} to be {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then(r#"the latest run of gate "{gate}" on branch "{name}" is "{status}""#)]
fn latest_gate_run(
    world: &mut FactoryWorld,
    gate: String,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = GateRunStatus::try_from(status.as_str())?;
    let key = Factory::key(&name)?;
    let report = run_async(world.factory()?.branches.gate_status(&key))?;
    let Some(assessment) = report
        .gates
        .iter()
        .find(|assessment| assessment.gate.name().as_str() == gate)
    else {
        bail!("gate {gate} is not configured on {key}");
    };
    let Some(run) = assessment.latest.as_ref() else {
        bail!("gate {gate} has never run on {key}");
    };
    ensure!(
        run.status() == expected,
        "expected gate {gate} to be {expected}, found {}",
        run.status()
    );
    Ok(())
}

#[then(r#"the merge fails with "{message}""#)]
fn merge_fails(world: &mut FactoryWorld, message: String) -> Result<(), eyre::Report> {
    match world.last_merge.take() {
        Some(Err(err)) => {
            ensure!(
                err.to_string().contains(&message),
                "expected merge error containing {message:?}, got {err}"
            );
            ensure!(err.kind() == ErrorKind::PreconditionFailed, "unexpected kind for {err}");
            Ok(())
        }
        Some(Ok(report)) => bail!("merge of {} unexpectedly succeeded", report.branch.key()),
        None => bail!("no merge was attempted"),
    }
}

#[then(r#"master points at the head of branch "{name}""#)]
fn master_at_branch_head(world: &mut FactoryWorld, name: String) -> Result<(), eyre::Report> {
    let report = match world.last_merge.take() {
        Some(Ok(report)) => report,
        Some(Err(err)) => bail!("merge failed: {err}"),
        None => bail!("no merge was attempted"),
    };
    let factory = world.factory()?;
    let master = factory.origin_ref("refs/heads/master");
    ensure!(
        master.as_deref() == Some(report.master_rev.as_str()),
        "origin master {master:?} does not match merged head {}",
        report.master_rev
    );
    let key = Factory::key(&name)?;
    let branch = run_async(factory.branches.get(&key))?;
    ensure!(
        branch.head_rev() == Some(&report.master_rev),
        "branch {key} head {:?} differs from master",
        branch.head_rev()
    );
    Ok(())
}

#[then(r#"branch "{name}" is "{status}""#)]
fn branch_has_status(world: &mut FactoryWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let expected = BranchStatus::try_from(status.as_str())?;
    let key = Factory::key(&name)?;
    let branch = run_async(world.factory()?.branches.get(&key))?;
    ensure!(
        branch.status() == expected,
        "expected branch {key} to be {expected}, found {}",
        branch.status()
    );
    Ok(())
}

#[then(r#"branch creation fails naming blocker "{blocker}""#)]
fn creation_blocked(world: &mut FactoryWorld, blocker: String) -> Result<(), eyre::Report> {
    match world.last_create.take() {
        Some(Err(BranchLifecycleError::TaskBlocked { blockers, .. })) => {
            ensure!(
                blockers.iter().any(|key| key.to_string() == blocker),
                "expected blocker {blocker} in {blockers:?}"
            );
            Ok(())
        }
        Some(Err(err)) => bail!("expected a blocked task, got {err}"),
        Some(Ok(report)) => bail!("branch {} was unexpectedly created", report.branch.key()),
        None => bail!("no branch creation was attempted"),
    }
}

#[then(r#"no branch "{name}" exists"#)]
fn branch_absent(world: &mut FactoryWorld, name: String) -> Result<(), eyre::Report> {
    let factory = world.factory()?;
    let key = Factory::key(&name)?;
    match run_async(factory.branches.get(&key)) {
        Err(err) => ensure!(err.kind() == ErrorKind::NotFound, "unexpected error {err}"),
        Ok(branch) => bail!("branch {} exists", branch.key()),
    }
    ensure!(
        !factory.checkout(&name).exists(),
        "checkout for {name} was left behind"
    );
    ensure!(
        factory.origin_ref(&format!("refs/heads/{name}")).is_none(),
        "origin gained a ref for {name}"
    );
    Ok(())
}
