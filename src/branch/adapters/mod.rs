//! Adapter implementations for branch persistence, git and checkouts.

pub mod git;
pub mod memory;
pub mod postgres;

pub use git::{GitCli, LocalCheckout};
