//! `GitPort` implementation backed by the `git` command line.

use crate::branch::{
    domain::{BranchName, Revision},
    ports::{GitError, GitPort, GitResult},
};
use async_trait::async_trait;
use camino::Utf8Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, instrument};

/// Runs git subcommands in a given working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_owned(),
        }
    }
}

impl GitCli {
    /// Uses `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific git executable.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(super) async fn output(&self, cwd: &Utf8Path, args: &[&str]) -> GitResult<Output> {
        debug!(cwd = %cwd, args = ?args, "running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(GitError::runtime)
    }

    pub(super) async fn run_checked(&self, cwd: &Utf8Path, args: &[&str]) -> GitResult<String> {
        let output = self.output(cwd, args).await?;
        if !output.status.success() {
            return Err(command_failed(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs a yes/no query: exit 0 is `true`, exit 1 is `false`.
    async fn run_predicate(&self, cwd: &Utf8Path, args: &[&str]) -> GitResult<bool> {
        let output = self.output(cwd, args).await?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(command_failed(args, &output)),
        }
    }
}

fn command_failed(args: &[&str], output: &Output) -> GitError {
    GitError::CommandFailed {
        command: args.join(" "),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    }
}

#[async_trait]
impl GitPort for GitCli {
    #[instrument(skip_all, fields(path = %path, reference))]
    async fn resolve(&self, path: &Utf8Path, reference: &str) -> GitResult<Option<Revision>> {
        let spec = format!("{reference}^{{commit}}");
        let args = ["rev-parse", "--verify", "--quiet", spec.as_str()];
        let output = self.output(path, &args).await?;
        match output.status.code() {
            Some(0) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                Revision::new(stdout.trim())
                    .map(Some)
                    .map_err(|_| GitError::UnexpectedOutput {
                        command: args.join(" "),
                        output: stdout.into_owned(),
                    })
            }
            Some(1) => Ok(None),
            _ => Err(command_failed(&args, &output)),
        }
    }

    #[instrument(skip_all, fields(checkout = %checkout))]
    async fn is_clean(&self, checkout: &Utf8Path) -> GitResult<bool> {
        let status = self
            .run_checked(checkout, &["status", "--porcelain=v1", "-uall"])
            .await?;
        Ok(status.trim().is_empty())
    }

    #[instrument(skip_all, fields(checkout = %checkout))]
    async fn fetch(&self, checkout: &Utf8Path) -> GitResult<()> {
        self.run_checked(checkout, &["fetch", "--quiet", "origin"])
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(checkout = %checkout, branch = %branch))]
    async fn push_branch(&self, checkout: &Utf8Path, branch: &BranchName) -> GitResult<()> {
        let refspec = format!("HEAD:{}", branch.ref_name());
        self.run_checked(checkout, &["push", "--quiet", "origin", refspec.as_str()])
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path, ancestor = %ancestor, descendant = %descendant))]
    async fn is_ancestor(
        &self,
        path: &Utf8Path,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> GitResult<bool> {
        self.run_predicate(
            path,
            &[
                "merge-base",
                "--is-ancestor",
                ancestor.as_str(),
                descendant.as_str(),
            ],
        )
        .await
    }

    #[instrument(skip_all, fields(repo = %repo, reference, new = %new))]
    async fn update_ref(
        &self,
        repo: &Utf8Path,
        reference: &str,
        new: &Revision,
        expected_old: Option<&Revision>,
    ) -> GitResult<()> {
        let mut args = vec!["update-ref", reference, new.as_str()];
        if let Some(old) = expected_old {
            args.push(old.as_str());
        }
        self.run_checked(repo, &args).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %repo, reference))]
    async fn delete_ref(&self, repo: &Utf8Path, reference: &str) -> GitResult<()> {
        self.run_checked(repo, &["update-ref", "-d", reference])
            .await?;
        Ok(())
    }
}
