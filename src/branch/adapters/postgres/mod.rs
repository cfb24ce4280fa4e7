//! `PostgreSQL` adapters for branch persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BranchPgPool, PostgresBranchRepository};
