//! Diesel row models for branch persistence.

use super::schema::branches;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result and insert row for branch records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = branches)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BranchRow {
    /// Repository name.
    pub repo: String,
    /// Branch name.
    pub name: String,
    /// Base revision.
    pub base_rev: Option<String>,
    /// Head revision.
    pub head_rev: Option<String>,
    /// Checkout backend.
    pub env_backend: String,
    /// Checkout directory.
    pub env_path: String,
    /// Status.
    pub status: String,
    /// Linked task repository.
    pub task_repo: Option<String>,
    /// Linked task slug.
    pub task_slug: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Changeset for lifecycle updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = branches)]
#[diesel(treat_none_as_null = true)]
pub struct BranchChangeset {
    /// Head revision.
    pub head_rev: Option<String>,
    /// Status.
    pub status: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}
