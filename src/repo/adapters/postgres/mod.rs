//! `PostgreSQL` adapter for the repository registry.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresRepositoryStore, RepoPgPool};
