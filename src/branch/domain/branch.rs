//! Branch aggregate root and its lifecycle state machine.

use super::{
    BranchDomainError, BranchKey, ParseBranchStatusError, ParseEnvironmentBackendError, Revision,
};
use crate::task::domain::TaskKey;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch lifecycle status.
///
/// `active` is the only non-terminal status; transitions never go backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    /// Work is in progress in the branch checkout.
    Active,
    /// The branch was fast-forwarded into `master`.
    Merged,
    /// The branch was discarded.
    Abandoned,
}

impl BranchStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Merged => "merged",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BranchStatus {
    type Error = ParseBranchStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "merged" => Ok(Self::Merged),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(ParseBranchStatusError(value.to_owned())),
        }
    }
}

/// Where a branch checkout lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentBackend {
    /// A directory on the local filesystem.
    #[default]
    Local,
}

impl EnvironmentBackend {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
        }
    }
}

impl fmt::Display for EnvironmentBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EnvironmentBackend {
    type Error = ParseEnvironmentBackendError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            _ => Err(ParseEnvironmentBackendError(value.to_owned())),
        }
    }
}

/// Requested checkout placement for a new branch.
///
/// Without an explicit path the checkout goes under the configured checkout
/// root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSpec {
    /// Checkout backend.
    pub backend: EnvironmentBackend,
    /// Explicit checkout directory.
    pub path: Option<Utf8PathBuf>,
}

impl EnvironmentSpec {
    /// Requests a local checkout at `path`.
    #[must_use]
    pub fn local_at(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            backend: EnvironmentBackend::Local,
            path: Some(path.into()),
        }
    }
}

/// Materialised checkout of a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    backend: EnvironmentBackend,
    path: Utf8PathBuf,
}

impl Environment {
    /// Creates an environment description.
    #[must_use]
    pub const fn new(backend: EnvironmentBackend, path: Utf8PathBuf) -> Self {
        Self { backend, path }
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> EnvironmentBackend {
        self.backend
    }

    /// Returns the checkout directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Input for recording a newly created branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBranchData {
    /// Branch key.
    pub key: BranchKey,
    /// `master` tip before the checkout was created, if `master` existed.
    pub base_rev: Option<Revision>,
    /// Checkout HEAD after creation, if it resolved.
    pub head_rev: Option<Revision>,
    /// Checkout location.
    pub environment: Environment,
    /// Linked task.
    pub task: Option<TaskKey>,
}

/// Parameter object for reconstructing a persisted branch aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBranchData {
    /// Persisted branch key.
    pub key: BranchKey,
    /// Persisted base revision.
    pub base_rev: Option<Revision>,
    /// Persisted head revision.
    pub head_rev: Option<Revision>,
    /// Persisted environment.
    pub environment: Environment,
    /// Persisted status.
    pub status: BranchStatus,
    /// Persisted task link.
    pub task: Option<TaskKey>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}

/// Branch aggregate root.
///
/// The branch holds the only link between itself and a task; tasks never
/// reference branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    key: BranchKey,
    base_rev: Option<Revision>,
    head_rev: Option<Revision>,
    environment: Environment,
    status: BranchStatus,
    task: Option<TaskKey>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl Branch {
    /// Creates a new active branch.
    #[must_use]
    pub fn new(data: NewBranchData, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            key: data.key,
            base_rev: data.base_rev,
            head_rev: data.head_rev,
            environment: data.environment,
            status: BranchStatus::Active,
            task: data.task,
            created_at: timestamp,
            updated_at: timestamp,
            merged_at: None,
        }
    }

    /// Reconstructs a branch from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBranchData) -> Self {
        Self {
            key: data.key,
            base_rev: data.base_rev,
            head_rev: data.head_rev,
            environment: data.environment,
            status: data.status,
            task: data.task,
            created_at: data.created_at,
            updated_at: data.updated_at,
            merged_at: data.merged_at,
        }
    }

    /// Returns the branch key.
    #[must_use]
    pub const fn key(&self) -> &BranchKey {
        &self.key
    }

    /// Returns the `master` tip the branch was cut from.
    #[must_use]
    pub const fn base_rev(&self) -> Option<&Revision> {
        self.base_rev.as_ref()
    }

    /// Returns the last recorded HEAD.
    #[must_use]
    pub const fn head_rev(&self) -> Option<&Revision> {
        self.head_rev.as_ref()
    }

    /// Returns the checkout environment.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> BranchStatus {
        self.status
    }

    /// Returns the linked task.
    #[must_use]
    pub const fn task(&self) -> Option<&TaskKey> {
        self.task.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the branch was merged.
    #[must_use]
    pub const fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Fails unless the branch is active.
    ///
    /// # Errors
    ///
    /// Returns [`BranchDomainError::NotActive`] naming the current status.
    pub fn ensure_active(&self) -> Result<(), BranchDomainError> {
        if self.status == BranchStatus::Active {
            return Ok(());
        }
        Err(BranchDomainError::NotActive {
            branch: self.key.clone(),
            status: self.status,
        })
    }

    /// Marks the branch merged at `head`.
    ///
    /// # Errors
    ///
    /// Returns [`BranchDomainError::NotActive`] when already terminal.
    pub fn mark_merged(&mut self, head: Revision, clock: &impl Clock) -> Result<(), BranchDomainError> {
        self.ensure_active()?;
        let timestamp = clock.utc();
        self.head_rev = Some(head);
        self.status = BranchStatus::Merged;
        self.merged_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    /// Marks the branch abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`BranchDomainError::NotActive`] when already terminal.
    pub fn mark_abandoned(&mut self, clock: &impl Clock) -> Result<(), BranchDomainError> {
        self.ensure_active()?;
        self.status = BranchStatus::Abandoned;
        self.updated_at = clock.utc();
        Ok(())
    }
}
