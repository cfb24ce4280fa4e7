//! Error classification shared by every orchestration service.
//!
//! Service errors are rich enums local to each bounded context. Callers that
//! only need to decide how to react (report a missing key, ask the user to fix
//! a precondition, or surface an infrastructure fault) use [`ErrorKind`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of an orchestration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A repository, branch, task, gate or session does not exist.
    NotFound,
    /// The entity exists but is in the wrong state for the operation.
    PreconditionFailed,
    /// A subprocess could not be started or the store failed.
    ExternalToolFailure,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PreconditionFailed => "precondition_failed",
            Self::ExternalToolFailure => "external_tool_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort step that failed after an operation had already succeeded.
///
/// Advisory failures are logged and reported, never returned as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryWarning {
    /// Short identifier of the cleanup step (for example `delete_branch_ref`).
    pub step: String,
    /// Human-readable failure description.
    pub message: String,
}

impl AdvisoryWarning {
    /// Creates a warning for the named step.
    #[must_use]
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}
