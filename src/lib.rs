//! Gantry: software-factory workflow orchestration.
//!
//! This crate tracks units of work (tasks), the isolated git checkouts agents
//! operate in (branches), the coding-agent subprocesses that modify those
//! checkouts, and the verification commands (gates) that must pass before a
//! branch may be merged.
//!
//! # Architecture
//!
//! Gantry follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, git, processes)
//! - **Services**: Orchestration that composes ports into operations
//!
//! # Modules
//!
//! - [`repo`]: Registry of target repositories branches are cut from
//! - [`task`]: Task records and dependency-blocking resolution
//! - [`gate`]: Gate configuration and the gate runtime
//! - [`agent`]: Coding-agent session tracking and process lifecycle
//! - [`branch`]: Branch lifecycle manager (create, merge, abandon)
//! - [`events`]: Fire-and-forget lifecycle notifications

pub mod agent;
pub mod branch;
pub mod config;
pub mod error;
pub mod events;
mod fs;
pub mod gate;
pub mod repo;
pub mod shell;
pub mod task;
pub mod telemetry;
