//! Adapter implementations for the repository registry.

pub mod memory;
pub mod postgres;
