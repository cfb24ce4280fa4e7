//! Domain model for branches and their checkouts.

mod branch;
mod error;
mod ids;

pub use branch::{
    Branch, BranchStatus, Environment, EnvironmentBackend, EnvironmentSpec, NewBranchData,
    PersistedBranchData,
};
pub use error::{BranchDomainError, ParseBranchStatusError, ParseEnvironmentBackendError};
pub use ids::{BranchKey, BranchName, MASTER_BRANCH, Revision};
