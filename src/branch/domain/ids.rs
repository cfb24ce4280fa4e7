//! Identifier types for branches.

use super::BranchDomainError;
use crate::repo::domain::RepoName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum branch name length accepted by the persistence schema.
const MAX_BRANCH_NAME_LENGTH: usize = 200;

/// Integration branch that merges fast-forward into. Never a work branch.
pub const MASTER_BRANCH: &str = "master";

/// Validated git branch name.
///
/// Accepts the subset of `git check-ref-format --branch` that is safe to use
/// as a directory path: slash-separated components of printable ASCII that do
/// not start with `.` or `-`, contain no `..`, `@{` or shell metacharacters,
/// and do not end in `.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`BranchDomainError::InvalidName`] when the value is not a
    /// usable branch name and [`BranchDomainError::ReservedName`] for
    /// [`MASTER_BRANCH`] or any name nested below it, which git could not
    /// store next to `master`.
    pub fn new(value: impl Into<String>) -> Result<Self, BranchDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if !is_valid_branch_name(trimmed) {
            return Err(BranchDomainError::InvalidName(raw));
        }
        if trimmed.split('/').next() == Some(MASTER_BRANCH) {
            return Err(BranchDomainError::ReservedName(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name as a single path component, with `/` written `%2F`.
    ///
    /// `%` never appears in a valid name, so distinct names map to distinct
    /// components and `feat` never becomes a parent of `feat/x`.
    #[must_use]
    pub fn path_segment(&self) -> String {
        self.0.replace('/', "%2F")
    }

    /// Returns the fully qualified ref, `refs/heads/<name>`.
    #[must_use]
    pub fn ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty()
        || name.len() > MAX_BRANCH_NAME_LENGTH
        || name == "HEAD"
        || name.contains("..")
        || name.contains("@{")
    {
        return false;
    }
    let allowed_chars = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-' | '/' | '+'));
    allowed_chars
        && name.split('/').all(|component| {
            !component.is_empty()
                && !component.starts_with('.')
                && !component.starts_with('-')
                && !component.ends_with(".lock")
        })
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = BranchDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

/// Unique branch key `{repo, name}`, written `owner/repo/name`.
///
/// The repository always has exactly two components, so branch names may
/// themselves contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchKey {
    repo: RepoName,
    name: BranchName,
}

impl BranchKey {
    /// Creates a key from validated parts.
    #[must_use]
    pub const fn new(repo: RepoName, name: BranchName) -> Self {
        Self { repo, name }
    }

    /// Creates a key from raw parts.
    ///
    /// # Errors
    ///
    /// Returns a [`BranchDomainError`] when either part is invalid.
    pub fn from_parts(repo: &str, name: &str) -> Result<Self, BranchDomainError> {
        Ok(Self::new(RepoName::new(repo)?, BranchName::new(name)?))
    }

    /// Returns the repository component.
    #[must_use]
    pub const fn repo(&self) -> &RepoName {
        &self.repo
    }

    /// Returns the branch name component.
    #[must_use]
    pub const fn name(&self) -> &BranchName {
        &self.name
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo, self.name)
    }
}

impl FromStr for BranchKey {
    type Err = BranchDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.splitn(3, '/');
        let (Some(owner), Some(repo), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(BranchDomainError::InvalidKey(s.to_owned()));
        };
        Self::from_parts(&format!("{owner}/{repo}"), name)
            .map_err(|_| BranchDomainError::InvalidKey(s.to_owned()))
    }
}

impl TryFrom<String> for BranchKey {
    type Error = BranchDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BranchKey> for String {
    fn from(value: BranchKey) -> Self {
        value.to_string()
    }
}

/// Opaque git object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Creates a revision from a non-empty string.
    ///
    /// # Errors
    ///
    /// Returns [`BranchDomainError::EmptyRevision`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, BranchDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BranchDomainError::EmptyRevision);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the revision as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first seven characters for display.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Revision {
    type Error = BranchDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Revision> for String {
    fn from(value: Revision) -> Self {
        value.0
    }
}
