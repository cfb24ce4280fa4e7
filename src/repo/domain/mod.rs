//! Domain model for registered repositories.

mod error;
mod repository;

pub use error::RepoDomainError;
pub use repository::{PersistedRepositoryData, RepoName, Repository};
