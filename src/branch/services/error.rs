//! Error type for branch lifecycle operations.

use crate::agent::services::AgentSessionServiceError;
use crate::branch::{
    domain::{BranchDomainError, BranchKey, Revision},
    ports::{BranchRepositoryError, CheckoutError, GitError},
};
use crate::error::ErrorKind;
use crate::gate::{
    domain::{GateName, GateRunId, GateRunStatus},
    ports::GateConfigError,
    services::GateRuntimeError,
};
use crate::repo::{domain::RepoName, ports::RepositoryStoreError};
use crate::task::{
    domain::{TaskDomainError, TaskKey},
    ports::TaskRepositoryError,
};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors returned by the branch lifecycle manager.
#[derive(Debug, Error)]
pub enum BranchLifecycleError {
    /// Branch validation or transition failed.
    #[error(transparent)]
    Domain(#[from] BranchDomainError),

    /// Task validation or transition failed.
    #[error(transparent)]
    Task(#[from] TaskDomainError),

    /// The target repository is not registered.
    #[error("repository {0} is not registered")]
    RepositoryNotFound(RepoName),

    /// No branch exists with the given key.
    #[error("branch {0} not found")]
    BranchNotFound(BranchKey),

    /// No task exists with the given key.
    #[error("task {0} not found")]
    TaskNotFound(TaskKey),

    /// A selected gate is not declared by the checkout.
    #[error("gate '{gate}' is not configured for branch {branch}")]
    GateNotConfigured {
        /// Branch key.
        branch: BranchKey,
        /// Requested gate name.
        gate: String,
    },

    /// A branch with the same key already exists.
    #[error("branch {0} already exists")]
    AlreadyExists(BranchKey),

    /// The checkout directory is, contains or sits inside another active
    /// branch's checkout.
    #[error("checkout {path} overlaps the checkout of active branch {holder}")]
    CheckoutOverlap {
        /// Requested checkout directory.
        path: Utf8PathBuf,
        /// Active branch whose checkout overlaps it.
        holder: BranchKey,
    },

    /// The linked task has unresolved dependencies.
    #[error("task {task} is blocked by {}", join_keys(blockers))]
    TaskBlocked {
        /// Task that was requested.
        task: TaskKey,
        /// Unsatisfied dependencies, in declaration order.
        blockers: Vec<TaskKey>,
    },

    /// The branch has no linked task.
    #[error("branch {0} is not linked to a task")]
    NoLinkedTask(BranchKey),

    /// An agent was requested but no launcher is configured.
    #[error("no agent launcher is configured")]
    AgentsUnavailable,

    /// The checkout has uncommitted or untracked changes.
    #[error("branch {0} has uncommitted changes; commit them or merge with force")]
    DirtyWorkingTree(BranchKey),

    /// The checkout HEAD does not point at a commit.
    #[error("branch {0} has no commits")]
    NoCommits(BranchKey),

    /// A configured gate has no recorded run.
    #[error("gate {gate} has never run on {branch}; run it before merging")]
    GateNeverRun {
        /// Branch key.
        branch: BranchKey,
        /// Gate name.
        gate: GateName,
    },

    /// The latest run of a configured gate did not pass.
    #[error("gate {gate} has not passed (run {run} is {status}); retry it before merging")]
    GateNotPassed {
        /// Gate name.
        gate: GateName,
        /// Latest run.
        run: GateRunId,
        /// Status of the latest run.
        status: GateRunStatus,
    },

    /// The latest run of a configured gate passed at an older revision.
    #[error(
        "gate {gate} passed at {} but HEAD is now {}; re-run it before merging",
        passed_at.short(),
        head.short()
    )]
    GateStale {
        /// Gate name.
        gate: GateName,
        /// Revision the gate passed at.
        passed_at: Revision,
        /// Current HEAD.
        head: Revision,
    },

    /// `master` is not an ancestor of the branch tip.
    #[error(
        "branch {branch} cannot be fast-forwarded: master {} is not an ancestor of {}",
        master.short(),
        head.short()
    )]
    NonFastForward {
        /// Branch key.
        branch: BranchKey,
        /// Current `master` tip.
        master: Revision,
        /// Branch tip.
        head: Revision,
    },

    /// Abandoning without force needs explicit confirmation.
    #[error("abandoning branch {0} requires confirmation")]
    ConfirmationRequired(BranchKey),

    /// Repository registry failure.
    #[error(transparent)]
    Repositories(#[from] RepositoryStoreError),

    /// Branch store failure.
    #[error(transparent)]
    Branches(#[from] BranchRepositoryError),

    /// Task store failure.
    #[error(transparent)]
    Tasks(#[from] TaskRepositoryError),

    /// Git failure.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Checkout failure.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Gate configuration could not be loaded.
    #[error(transparent)]
    GateConfig(#[from] GateConfigError),

    /// Gate runtime failure.
    #[error(transparent)]
    Gates(#[from] GateRuntimeError),

    /// Agent session failure.
    #[error(transparent)]
    Agent(#[from] AgentSessionServiceError),
}

impl BranchLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RepositoryNotFound(_)
            | Self::BranchNotFound(_)
            | Self::TaskNotFound(_)
            | Self::GateNotConfigured { .. }
            | Self::Branches(BranchRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Domain(_)
            | Self::Task(_)
            | Self::AlreadyExists(_)
            | Self::CheckoutOverlap { .. }
            | Self::TaskBlocked { .. }
            | Self::NoLinkedTask(_)
            | Self::AgentsUnavailable
            | Self::DirtyWorkingTree(_)
            | Self::NoCommits(_)
            | Self::GateNeverRun { .. }
            | Self::GateNotPassed { .. }
            | Self::GateStale { .. }
            | Self::NonFastForward { .. }
            | Self::ConfirmationRequired(_)
            | Self::Repositories(RepositoryStoreError::Duplicate(_))
            | Self::Branches(BranchRepositoryError::Duplicate(_))
            | Self::Checkout(CheckoutError::AlreadyExists(_)) => ErrorKind::PreconditionFailed,
            Self::Tasks(err) => task_store_kind(err),
            Self::Gates(err) => err.kind(),
            Self::Agent(err) => err.kind(),
            Self::Repositories(RepositoryStoreError::Persistence(_))
            | Self::Branches(BranchRepositoryError::Persistence(_))
            | Self::Git(_)
            | Self::Checkout(_)
            | Self::GateConfig(_) => ErrorKind::ExternalToolFailure,
        }
    }
}

const fn task_store_kind(err: &TaskRepositoryError) -> ErrorKind {
    match err {
        TaskRepositoryError::Duplicate(_) => ErrorKind::PreconditionFailed,
        TaskRepositoryError::NotFound(_) => ErrorKind::NotFound,
        TaskRepositoryError::Persistence(_) => ErrorKind::ExternalToolFailure,
    }
}

fn join_keys(keys: &[TaskKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for branch lifecycle operations.
pub type BranchLifecycleResult<T> = Result<T, BranchLifecycleError>;
