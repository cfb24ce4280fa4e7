//! Diesel row models for gate run history.

use super::schema::gate_runs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for gate runs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = gate_runs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GateRunRow {
    /// Run identifier.
    pub id: i64,
    /// Branch repository.
    pub branch_repo: String,
    /// Branch name.
    pub branch_name: String,
    /// Gate name.
    pub gate_name: String,
    /// Revision under test.
    pub rev: String,
    /// Status.
    pub status: String,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Finish timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Exit code.
    pub exit_code: Option<i32>,
    /// Log file path.
    pub log_path: String,
}

/// Insert row for a new running gate run; the id is assigned by the
/// database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = gate_runs)]
pub struct NewGateRunRow {
    /// Branch repository.
    pub branch_repo: String,
    /// Branch name.
    pub branch_name: String,
    /// Gate name.
    pub gate_name: String,
    /// Revision under test.
    pub rev: String,
    /// Status.
    pub status: String,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Log file path.
    pub log_path: String,
}
