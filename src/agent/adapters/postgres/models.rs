//! Diesel row models for agent session persistence.

use super::schema::agent_sessions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result and insert row for agent sessions.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = agent_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AgentSessionRow {
    /// Session identifier.
    pub id: Uuid,
    /// Branch repository.
    pub branch_repo: String,
    /// Branch name.
    pub branch_name: String,
    /// Agent kind.
    pub agent_type: String,
    /// Prompt.
    pub prompt: String,
    /// OS process id.
    pub pid: Option<i64>,
    /// Status.
    pub status: String,
    /// Exit code.
    pub exit_code: Option<i32>,
    /// Creation timestamp.
    pub started_at: DateTime<Utc>,
    /// Terminal timestamp.
    pub ended_at: Option<DateTime<Utc>>,
}
