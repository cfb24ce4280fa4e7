//! Task records and dependency-blocking resolution.
//!
//! A task is a unit of work keyed by `{repo, slug}`. Callers create tasks and
//! read them; status transitions are driven exclusively by the branch
//! lifecycle manager so the task/branch link cannot diverge. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Task service and dependency resolver in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
