//! Coding-agent session tracking and process lifecycle.
//!
//! Each session owns at most one OS process. The stored status follows
//! `created → running → {completed, failed}`, with `needs_help` reserved for
//! the agent's own tooling to signal that it is stuck.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
