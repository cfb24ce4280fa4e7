//! `PostgreSQL` integration tests for the factory stores.
//!
//! Tests are organised into modules by store:
//! - `helpers`: template database, per-test databases and seed rows
//! - `task_tests`: task round-trips, updates and dependency arrays
//! - `branch_tests`: branch updates, filters and foreign keys
//! - `gate_run_tests`: run insertion, the single finish and latest-run lookup
//! - `agent_session_tests`: session lifecycle persistence
//! - `schema_tests`: `CHECK` constraints the migration enforces

mod postgres {
    pub mod helpers;

    mod agent_session_tests;
    mod branch_tests;
    mod gate_run_tests;
    mod schema_tests;
    mod task_tests;
}
