//! `PostgreSQL` adapters for gate run history.

mod models;
mod repository;
mod schema;

pub use repository::{GateRunPgPool, PostgresGateRunRepository};
