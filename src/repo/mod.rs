//! Registry of target repositories.
//!
//! Branches are cut from a registered repository: a bare git repository
//! reachable by filesystem path that acts as the `origin` of every checkout.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Registry service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
