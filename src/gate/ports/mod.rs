//! Port contracts for gate configuration, execution and run history.

mod config;
mod executor;
mod run_repository;

pub use config::{GateConfigError, GateConfigSource};
pub use executor::{GateExecutionError, GateExecutor, GateInvocation};
pub use run_repository::{GateRunRepository, GateRunRepositoryError, GateRunRepositoryResult};
