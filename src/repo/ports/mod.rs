//! Port contracts for the repository registry.

pub mod store;

pub use store::{RepositoryStore, RepositoryStoreError, RepositoryStoreResult};
