//! `CheckoutPort` implementation creating local clones.

use super::GitCli;
use crate::branch::{
    domain::{BranchName, Revision},
    ports::{CheckoutError, CheckoutPort, CheckoutResult},
};
use crate::fs::{create_and_open_dir, remove_dir_all_if_exists};
use async_trait::async_trait;
use camino::Utf8Path;
use std::io;
use tracing::{debug, instrument};

/// Creates branch checkouts with `git clone` on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalCheckout {
    git: GitCli,
}

impl LocalCheckout {
    /// Creates a checkout adapter using `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a checkout adapter using a specific git runner.
    #[must_use]
    pub const fn with_git(git: GitCli) -> Self {
        Self { git }
    }
}

#[async_trait]
impl CheckoutPort for LocalCheckout {
    #[instrument(skip_all, fields(source = %source, branch = %branch, dest = %dest))]
    async fn create(
        &self,
        source: &Utf8Path,
        branch: &BranchName,
        start: Option<&Revision>,
        dest: &Utf8Path,
    ) -> CheckoutResult<()> {
        let name = dest.file_name().ok_or_else(|| {
            CheckoutError::runtime(io::Error::other(format!("checkout path {dest} has no name")))
        })?;
        let parent_path = dest
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let parent = create_and_open_dir(parent_path).map_err(CheckoutError::runtime)?;
        if parent.exists(name) {
            return Err(CheckoutError::AlreadyExists(dest.to_owned()));
        }

        self.git
            .run_checked(
                Utf8Path::new("."),
                &["clone", "--quiet", source.as_str(), dest.as_str()],
            )
            .await?;

        let mut args = vec!["checkout", "--quiet", "-b", branch.as_str()];
        if let Some(rev) = start {
            args.push(rev.as_str());
        }
        if let Err(err) = self.git.run_checked(dest, &args).await {
            remove_dir_all_if_exists(dest).map_err(CheckoutError::runtime)?;
            return Err(err.into());
        }
        debug!("checkout created");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn remove(&self, path: &Utf8Path) -> CheckoutResult<()> {
        remove_dir_all_if_exists(path).map_err(CheckoutError::runtime)
    }
}
