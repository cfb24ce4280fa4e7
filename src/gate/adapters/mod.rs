//! Adapter implementations for gate configuration, execution and history.

mod config;
pub mod memory;
pub mod postgres;
mod shell;

pub use config::{GATE_CONFIG_FILE, TomlGateConfigSource};
pub use shell::ShellGateExecutor;
