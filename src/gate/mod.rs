//! Gate configuration and the gate runtime.
//!
//! A gate is a named shell command that must exit zero against a specific
//! revision before a branch may merge. Every invocation is recorded as an
//! immutable [`domain::GateRun`]; the latest run per `(branch, gate)` decides
//! mergeability.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
