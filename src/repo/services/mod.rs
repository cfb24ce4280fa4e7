//! Application services for the repository registry.

mod registry;

pub use registry::{RegisterRepositoryRequest, RepositoryService, RepositoryServiceError};
