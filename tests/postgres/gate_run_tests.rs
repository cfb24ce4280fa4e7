//! Gate run insertion, completion and latest-run lookup against `PostgreSQL`.

use crate::postgres::helpers::{TestDatabase, stored};
use camino::Utf8PathBuf;
use chrono::Utc;
use eyre::{Result, bail, ensure};
use gantry::branch::domain::{BranchKey, Revision};
use gantry::gate::{
    adapters::postgres::PostgresGateRunRepository,
    domain::{GateName, GateOutcome, GateRun, GateRunId, GateRunStatus, NewGateRun},
    ports::{GateRunRepository, GateRunRepositoryError},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

fn new_run(branch: &BranchKey, gate: &str, rev: &str) -> Result<NewGateRun> {
    Ok(NewGateRun {
        branch: branch.clone(),
        gate: GateName::new(gate)?,
        rev: Revision::new(rev)?,
        log_path: Utf8PathBuf::from(format!("/srv/logs/{gate}-{rev}.log")),
        started_at: Utc::now(),
    })
}

struct GateRunContext {
    db: TestDatabase,
    runs: PostgresGateRunRepository,
    branch: BranchKey,
}

impl GateRunContext {
    fn new(cluster: &'static TestCluster, label: &str) -> Result<Self> {
        let db = TestDatabase::create(cluster, label)?;
        db.register_repo()?;
        let branch = db.add_branch("fix-1-branch", None)?.key().clone();
        let runs = PostgresGateRunRepository::new(db.pool.clone());
        Ok(Self { db, runs, branch })
    }

    fn start(&self, gate: &str, rev: &str) -> Result<GateRun> {
        Ok(self
            .db
            .rt
            .block_on(self.runs.insert(new_run(&self.branch, gate, rev)?))?)
    }

    fn finish(&self, run: &mut GateRun, outcome: GateOutcome) -> Result<()> {
        run.finish(outcome, &DefaultClock)?;
        Ok(self.db.rt.block_on(self.runs.finish(run))?)
    }
}

#[rstest]
fn inserted_runs_start_running_and_finish_once(
    shared_test_cluster: &'static TestCluster,
) -> Result<()> {
    let context = GateRunContext::new(shared_test_cluster, "gate_finish")?;
    let mut run = context.start("test", "aaaa")?;
    ensure!(run.status() == GateRunStatus::Running);
    ensure!(run.finished_at().is_none());

    context.finish(&mut run, GateOutcome::Exited(3))?;
    let Some(found) = context.db.rt.block_on(context.runs.find(run.id()))? else {
        bail!("run {} was not stored", run.id());
    };
    ensure!(found.status() == GateRunStatus::Failed);
    ensure!(found.exit_code() == Some(3));
    ensure!(found.finished_at() == run.finished_at().map(stored));
    ensure!(found.started_at() == stored(run.started_at()));
    ensure!(found.log_path() == run.log_path());
    ensure!(found.rev().as_str() == "aaaa");

    let mut replay = GateRun::started(run.id(), new_run(&context.branch, "test", "aaaa")?);
    replay.finish(GateOutcome::Exited(0), &DefaultClock)?;
    let second = context.db.rt.block_on(context.runs.finish(&replay));
    ensure!(
        matches!(&second, Err(GateRunRepositoryError::NotRunning(id)) if *id == run.id()),
        "a finished row must not be finished again: {second:?}"
    );
    let Some(unchanged) = context.db.rt.block_on(context.runs.find(run.id()))? else {
        bail!("run {} disappeared", run.id());
    };
    ensure!(unchanged.status() == GateRunStatus::Failed);
    ensure!(unchanged.exit_code() == Some(3));
    Ok(())
}

#[rstest]
fn finishing_an_unknown_run_is_rejected(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let context = GateRunContext::new(shared_test_cluster, "gate_unknown")?;
    let mut ghost = GateRun::started(GateRunId::new(9_999), new_run(&context.branch, "test", "aaaa")?);
    ghost.finish(GateOutcome::Exited(0), &DefaultClock)?;

    let result = context.db.rt.block_on(context.runs.finish(&ghost));
    ensure!(
        matches!(&result, Err(GateRunRepositoryError::NotRunning(id)) if *id == ghost.id()),
        "unexpected finish result {result:?}"
    );
    ensure!(context.db.rt.block_on(context.runs.find(ghost.id()))?.is_none());
    Ok(())
}

#[rstest]
fn latest_run_is_the_highest_id_per_gate(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let context = GateRunContext::new(shared_test_cluster, "gate_latest")?;
    let mut first = context.start("test", "aaaa")?;
    context.finish(&mut first, GateOutcome::Exited(1))?;
    let lint = context.start("lint", "aaaa")?;
    let mut second = context.start("test", "bbbb")?;
    context.finish(&mut second, GateOutcome::Exited(0))?;
    let third = context.start("test", "cccc")?;
    ensure!(first.id() < second.id() && second.id() < third.id());

    let test = GateName::new("test")?;
    let Some(latest) = context
        .db
        .rt
        .block_on(context.runs.latest(&context.branch, &test))?
    else {
        bail!("no latest run for gate test");
    };
    ensure!(latest.id() == third.id());
    ensure!(latest.status() == GateRunStatus::Running);
    ensure!(latest.rev().as_str() == "cccc");

    let Some(latest_lint) = context
        .db
        .rt
        .block_on(context.runs.latest(&context.branch, &GateName::new("lint")?))?
    else {
        bail!("no latest run for gate lint");
    };
    ensure!(latest_lint.id() == lint.id());
    ensure!(
        context
            .db
            .rt
            .block_on(context.runs.latest(&context.branch, &GateName::new("docs")?))?
            .is_none()
    );

    let history = context
        .db
        .rt
        .block_on(context.runs.list_for_branch(&context.branch))?;
    let ids: Vec<GateRunId> = history.iter().map(GateRun::id).collect();
    ensure!(ids == [first.id(), lint.id(), second.id(), third.id()], "history {ids:?}");
    Ok(())
}
