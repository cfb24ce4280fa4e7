//! Gate configuration values.

use super::GateDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum gate name length; names are used in log file names.
const MAX_GATE_NAME_LENGTH: usize = 100;

/// Validated gate name such as `test` or `lint`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GateName(String);

impl GateName {
    /// Creates a validated gate name.
    ///
    /// # Errors
    ///
    /// Returns [`GateDomainError::InvalidName`] when the value is empty, too
    /// long, or contains characters other than ASCII alphanumerics, `.`, `_`
    /// and `-`.
    pub fn new(value: impl Into<String>) -> Result<Self, GateDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_GATE_NAME_LENGTH
            && !trimmed.starts_with('.')
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
        if !is_valid {
            return Err(GateDomainError::InvalidName(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for GateName {
    type Error = GateDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GateName> for String {
    fn from(value: GateName) -> Self {
        value.0
    }
}

/// A configured gate: a name and the shell command that verifies it.
///
/// Gates are loaded fresh from the checkout for every operation and have no
/// identity beyond their name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    name: GateName,
    command: String,
}

impl Gate {
    /// Creates a gate.
    ///
    /// # Errors
    ///
    /// Returns [`GateDomainError::EmptyCommand`] for a blank command.
    pub fn new(name: GateName, command: impl Into<String>) -> Result<Self, GateDomainError> {
        let script = command.into();
        if script.trim().is_empty() {
            return Err(GateDomainError::EmptyCommand(name));
        }
        Ok(Self {
            name,
            command: script,
        })
    }

    /// Returns the gate name.
    #[must_use]
    pub const fn name(&self) -> &GateName {
        &self.name
    }

    /// Returns the shell command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}
