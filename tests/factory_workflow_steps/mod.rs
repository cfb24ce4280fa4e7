//! Step definitions for the gate-checked branch workflow scenarios.

mod given;
mod then;
mod when;
pub mod world;
