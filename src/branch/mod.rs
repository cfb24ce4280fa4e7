//! Branch lifecycle: checkouts, gate-checked fast-forward merges and
//! abandonment.
//!
//! The lifecycle manager in [`services`] is the only writer of task status.
//! It consults the dependency resolver before creating a checkout, the gate
//! runtime before merging, and the agent session manager after creation.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Lifecycle manager in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
