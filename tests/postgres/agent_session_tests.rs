//! Agent session persistence against `PostgreSQL`.

use crate::postgres::helpers::{TestDatabase, stored};
use eyre::{Result, bail, ensure};
use gantry::agent::{
    adapters::postgres::PostgresAgentSessionRepository,
    domain::{AgentSession, AgentSessionStatus, AgentType, NewAgentSession, ProcessId},
    ports::{AgentSessionRepository, AgentSessionRepositoryError},
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

#[rstest]
fn session_lifecycle_is_persisted_in_order(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "agent_sessions")?;
    let sessions = PostgresAgentSessionRepository::new(db.pool.clone());
    db.register_repo()?;
    let branch = db.add_branch("fix-1-branch", None)?.key().clone();

    let mut first = AgentSession::new(
        NewAgentSession {
            branch: branch.clone(),
            agent_type: AgentType::new("claude")?,
            prompt: "fix the parser".to_owned(),
        },
        &DefaultClock,
    )?;
    db.rt.block_on(sessions.insert(&first))?;
    first.mark_running(ProcessId::new(4242))?;
    db.rt.block_on(sessions.update(&first))?;
    first.mark_exited(Some(0), &DefaultClock)?;
    db.rt.block_on(sessions.update(&first))?;

    let Some(found) = db.rt.block_on(sessions.find(first.id()))? else {
        bail!("session {} was not stored", first.id());
    };
    ensure!(found.status() == AgentSessionStatus::Completed);
    ensure!(found.pid() == Some(ProcessId::new(4242)));
    ensure!(found.exit_code() == Some(0));
    ensure!(found.prompt() == "fix the parser");
    ensure!(found.started_at() == stored(first.started_at()));
    ensure!(found.ended_at() == first.ended_at().map(stored));

    let second = AgentSession::new(
        NewAgentSession {
            branch: branch.clone(),
            agent_type: AgentType::new("codex")?,
            prompt: "add tests".to_owned(),
        },
        &DefaultClock,
    )?;
    db.rt.block_on(sessions.insert(&second))?;
    let duplicate = db.rt.block_on(sessions.insert(&second));
    ensure!(
        matches!(&duplicate, Err(AgentSessionRepositoryError::Duplicate(id)) if *id == second.id()),
        "unexpected insert result {duplicate:?}"
    );

    let listed = db.rt.block_on(sessions.list_for_branch(&branch))?;
    let ids: Vec<_> = listed.iter().map(AgentSession::id).collect();
    ensure!(ids == [first.id(), second.id()], "sessions {ids:?}");
    Ok(())
}
