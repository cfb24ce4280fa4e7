//! `PostgreSQL` adapters for agent session persistence.

mod models;
mod repository;
mod schema;

pub use repository::{AgentSessionPgPool, PostgresAgentSessionRepository};
