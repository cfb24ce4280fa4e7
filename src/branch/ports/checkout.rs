//! Checkout collaborator contract.

use crate::branch::domain::{BranchName, Revision};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::GitError;

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Creates and removes isolated branch checkouts.
#[async_trait]
pub trait CheckoutPort: Send + Sync {
    /// Clones `source` into `dest` and checks out a new branch `branch`,
    /// starting at `start` when given.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadyExists`] when `dest` exists.
    async fn create(
        &self,
        source: &Utf8Path,
        branch: &BranchName,
        start: Option<&Revision>,
        dest: &Utf8Path,
    ) -> CheckoutResult<()>;

    /// Removes the checkout at `path`. A missing directory is not an error.
    async fn remove(&self, path: &Utf8Path) -> CheckoutResult<()>;
}

/// Errors returned by checkout adapters.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    /// The destination directory already exists.
    #[error("checkout directory {0} already exists")]
    AlreadyExists(Utf8PathBuf),

    /// A git command failed while preparing the checkout.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Filesystem failure.
    #[error("checkout filesystem error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl CheckoutError {
    /// Wraps a filesystem failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
