//! Diesel row models for the repository registry.

use super::schema::repositories;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result and insert row for registered repositories.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = repositories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RepositoryRow {
    /// Repository name.
    pub name: String,
    /// Origin repository path.
    pub path: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}
