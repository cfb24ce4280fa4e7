//! Repository aggregate and its validated name.

use super::RepoDomainError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized repository identifier in `owner/repo` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    /// Creates a validated repository name.
    ///
    /// # Errors
    ///
    /// Returns [`RepoDomainError::InvalidName`] if the value does not contain
    /// exactly one slash-delimited owner and repository segment, or contains
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, RepoDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        let Some((owner, repo)) = normalized.split_once('/') else {
            return Err(RepoDomainError::InvalidName(raw));
        };
        let is_valid = !owner.is_empty()
            && !repo.is_empty()
            && !repo.contains('/')
            && !normalized.chars().any(char::is_whitespace);

        if !is_valid {
            return Err(RepoDomainError::InvalidName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the full `owner/repo` name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the owner segment.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map_or("", |(owner, _)| owner)
    }

    /// Returns the repository segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, repo)| repo)
    }
}

impl AsRef<str> for RepoName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RepoName {
    type Error = RepoDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RepoName {
    type Error = RepoDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepoName> for String {
    fn from(value: RepoName) -> Self {
        value.0
    }
}

/// A registered target repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    name: RepoName,
    path: Utf8PathBuf,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRepositoryData {
    /// Persisted repository name.
    pub name: RepoName,
    /// Persisted path of the bare origin repository.
    pub path: Utf8PathBuf,
    /// Persisted registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl Repository {
    /// Registers a repository located at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoDomainError::EmptyPath`] when the path is blank.
    pub fn new(
        name: RepoName,
        path: impl Into<Utf8PathBuf>,
        clock: &impl Clock,
    ) -> Result<Self, RepoDomainError> {
        let location: Utf8PathBuf = path.into();
        if location.as_str().trim().is_empty() {
            return Err(RepoDomainError::EmptyPath);
        }
        Ok(Self {
            name,
            path: location,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a repository from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRepositoryData) -> Self {
        Self {
            name: data.name,
            path: data.path,
            created_at: data.created_at,
        }
    }

    /// Returns the repository name.
    #[must_use]
    pub const fn name(&self) -> &RepoName {
        &self.name
    }

    /// Returns the path of the bare origin repository.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
