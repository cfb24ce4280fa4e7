//! In-memory adapters for branch persistence.

mod branch;

pub use branch::InMemoryBranchRepository;
