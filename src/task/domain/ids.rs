//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use crate::repo::domain::RepoName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum slug length accepted by the persistence schema.
const MAX_SLUG_LENGTH: usize = 100;

/// Short, repository-unique task identifier such as `fix-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskSlug(String);

impl TaskSlug {
    /// Creates a validated slug.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidSlug`] when the value is empty, too
    /// long, or contains characters other than ASCII alphanumerics, `.`, `_`
    /// and `-`.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= MAX_SLUG_LENGTH
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !is_valid {
            return Err(TaskDomainError::InvalidSlug(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskSlug {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskSlug> for String {
    fn from(value: TaskSlug) -> Self {
        value.0
    }
}

/// Unique task key `{repo, slug}`, written `owner/repo/slug`.
///
/// The same type is used for `depends_on` references.
///
/// # Examples
///
///     use gantry::task::domain::TaskKey;
///
///     let key: TaskKey = "acme/widgets/fix-1".parse().expect("valid key");
///     assert_eq!(key.repo().as_str(), "acme/widgets");
///     assert_eq!(key.slug().as_str(), "fix-1");
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskKey {
    repo: RepoName,
    slug: TaskSlug,
}

impl TaskKey {
    /// Creates a key from validated parts.
    #[must_use]
    pub const fn new(repo: RepoName, slug: TaskSlug) -> Self {
        Self { repo, slug }
    }

    /// Creates a key from raw parts.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskDomainError`] when either part is invalid.
    pub fn from_parts(repo: &str, slug: &str) -> Result<Self, TaskDomainError> {
        Ok(Self::new(RepoName::new(repo)?, TaskSlug::new(slug)?))
    }

    /// Returns the repository component.
    #[must_use]
    pub const fn repo(&self) -> &RepoName {
        &self.repo
    }

    /// Returns the slug component.
    #[must_use]
    pub const fn slug(&self) -> &TaskSlug {
        &self.slug
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo, self.slug)
    }
}

impl FromStr for TaskKey {
    type Err = TaskDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repo, slug) = s
            .trim()
            .rsplit_once('/')
            .ok_or_else(|| TaskDomainError::InvalidReference(s.to_owned()))?;
        Self::from_parts(repo, slug).map_err(|_| TaskDomainError::InvalidReference(s.to_owned()))
    }
}

impl TryFrom<String> for TaskKey {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskKey> for String {
    fn from(value: TaskKey) -> Self {
        value.to_string()
    }
}

/// Task priority from 1 (highest) to 5 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Priority(u8);

impl Priority {
    /// Highest priority.
    pub const HIGHEST: Self = Self(1);
    /// Lowest priority.
    pub const LOWEST: Self = Self(5);

    /// Creates a validated priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPriority`] when the value is outside
    /// 1..=5.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|level| (Self::HIGHEST.0..=Self::LOWEST.0).contains(level))
            .map(Self)
            .ok_or(TaskDomainError::InvalidPriority(value))
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl TryFrom<i64> for Priority {
    type Error = TaskDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for i64 {
    fn from(value: Priority) -> Self {
        Self::from(value.0)
    }
}
