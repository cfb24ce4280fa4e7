//! Git collaborator contract.
//!
//! Every operation addresses a repository or checkout by filesystem path.
//! Any non-zero git exit that is not part of an operation's normal answer is
//! reported as [`GitError::CommandFailed`].

use crate::branch::domain::{BranchName, Revision};
use async_trait::async_trait;
use camino::Utf8Path;
use std::sync::Arc;
use thiserror::Error;

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Git operations required by the branch lifecycle manager.
#[async_trait]
pub trait GitPort: Send + Sync {
    /// Resolves `reference` to a commit in the repository at `path`.
    ///
    /// Returns `None` when the reference does not exist, for example
    /// `refs/heads/master` in an empty repository.
    async fn resolve(&self, path: &Utf8Path, reference: &str) -> GitResult<Option<Revision>>;

    /// Returns whether the checkout has no staged, unstaged or untracked
    /// changes.
    async fn is_clean(&self, checkout: &Utf8Path) -> GitResult<bool>;

    /// Fetches from the checkout's `origin` remote.
    async fn fetch(&self, checkout: &Utf8Path) -> GitResult<()>;

    /// Pushes the checkout's HEAD to `refs/heads/<branch>` on `origin`.
    async fn push_branch(&self, checkout: &Utf8Path, branch: &BranchName) -> GitResult<()>;

    /// Returns whether `ancestor` is an ancestor of (or equal to)
    /// `descendant`.
    async fn is_ancestor(
        &self,
        path: &Utf8Path,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> GitResult<bool>;

    /// Points `reference` at `new`, failing when `expected_old` is given and
    /// does not match the current value.
    async fn update_ref(
        &self,
        repo: &Utf8Path,
        reference: &str,
        new: &Revision,
        expected_old: Option<&Revision>,
    ) -> GitResult<()>;

    /// Deletes `reference`.
    async fn delete_ref(&self, repo: &Utf8Path, reference: &str) -> GitResult<()>;
}

/// Errors returned by git adapters.
#[derive(Debug, Clone, Error)]
pub enum GitError {
    /// Git ran and exited unsuccessfully.
    #[error("git {command} failed ({status}): {stderr}")]
    CommandFailed {
        /// Arguments passed to git.
        command: String,
        /// Exit status description.
        status: String,
        /// Trimmed standard error.
        stderr: String,
    },

    /// Git produced output that could not be interpreted.
    #[error("unexpected git output for {command}: {output}")]
    UnexpectedOutput {
        /// Arguments passed to git.
        command: String,
        /// Offending output.
        output: String,
    },

    /// Git could not be started.
    #[error("failed to run git: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl GitError {
    /// Wraps a process-level failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
