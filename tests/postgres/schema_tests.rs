//! Constraints the factory migration enforces below the stores.

use crate::postgres::helpers::TestDatabase;
use eyre::{Result, ensure};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;

const TASK_COLUMNS: &str = "INSERT INTO tasks (repo, slug, title, priority, status, created_at, updated_at)";

#[rstest]
#[case::priority_above_range(format!("{TASK_COLUMNS} VALUES ('acme/widgets', 'a', 'A', 6, 'open', NOW(), NOW())"))]
#[case::priority_below_range(format!("{TASK_COLUMNS} VALUES ('acme/widgets', 'a', 'A', 0, 'open', NOW(), NOW())"))]
#[case::unknown_task_status(format!("{TASK_COLUMNS} VALUES ('acme/widgets', 'a', 'A', 3, 'blocked', NOW(), NOW())"))]
#[case::unknown_gate_status(
    "INSERT INTO gate_runs (branch_repo, branch_name, gate_name, rev, status, started_at, log_path) \
     VALUES ('acme/widgets', 'fix-1-branch', 'test', 'aaaa', 'skipped', NOW(), '/tmp/log')"
        .to_owned()
)]
#[case::half_linked_task(
    "INSERT INTO branches (repo, name, env_backend, env_path, status, task_repo, created_at, updated_at) \
     VALUES ('acme/widgets', 'half', 'local', '/tmp/half', 'active', 'acme/widgets', NOW(), NOW())"
        .to_owned()
)]
fn migration_rejects_invalid_rows(
    shared_test_cluster: &'static TestCluster,
    #[case] statement: String,
) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "schema_checks")?;
    db.register_repo()?;
    db.add_branch("fix-1-branch", None)?;

    let result = db.execute(&statement);
    ensure!(
        result
            .as_ref()
            .is_err_and(|err| err.to_string().contains("violates check constraint")),
        "statement should violate a check constraint: {result:?}"
    );
    Ok(())
}

#[rstest]
fn defaults_fill_optional_task_columns(shared_test_cluster: &'static TestCluster) -> Result<()> {
    let db = TestDatabase::create(shared_test_cluster, "schema_defaults")?;
    let inserted = db.execute(
        "INSERT INTO tasks (repo, slug, title, status, created_at, updated_at) \
         VALUES ('acme/widgets', 'bare', 'Bare', 'open', NOW(), NOW())",
    )?;
    ensure!(inserted == 1);
    let matched = db.execute(
        "UPDATE tasks SET title = title \
         WHERE slug = 'bare' AND priority = 3 AND body = '' AND depends_on = '{}'",
    )?;
    ensure!(matched == 1, "defaults were not applied");
    Ok(())
}
