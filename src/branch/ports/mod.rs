//! Port contracts for the branch lifecycle.

mod checkout;
mod git;
mod repository;

pub use checkout::{CheckoutError, CheckoutPort, CheckoutResult};
pub use git::{GitError, GitPort, GitResult};
pub use repository::{BranchFilter, BranchRepository, BranchRepositoryError, BranchRepositoryResult};
