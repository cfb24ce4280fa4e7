//! Adapter implementations for agent sessions.

pub mod memory;
pub mod postgres;
mod process;

pub use process::OsAgentProcessHost;
