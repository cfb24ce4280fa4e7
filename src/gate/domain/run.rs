//! Gate run history records.

use super::{GateDomainError, GateName, ParseGateRunStatusError};
use crate::branch::domain::{BranchKey, Revision};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned gate run identifier.
///
/// Identifiers increase monotonically, so the highest id for a
/// `(branch, gate)` pair is the latest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateRunId(i64);

impl GateRunId {
    /// Wraps a store-assigned identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GateRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gate run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRunStatus {
    /// Recorded but not yet started.
    Pending,
    /// The command is executing, or the runtime crashed while it was.
    Running,
    /// The command exited zero.
    Passed,
    /// The command exited non-zero, was terminated, or could not start.
    Failed,
}

impl GateRunStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the run can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

impl fmt::Display for GateRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GateRunStatus {
    type Error = ParseGateRunStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseGateRunStatusError(value.to_owned())),
        }
    }
}

/// How a gate command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The process exited with a code.
    Exited(i32),
    /// The process was terminated by a signal.
    Terminated,
    /// The deadline expired and the process was killed.
    TimedOut,
    /// The process could not be started.
    NotStarted,
}

impl GateOutcome {
    /// Returns the terminal run status for this outcome.
    #[must_use]
    pub const fn status(self) -> GateRunStatus {
        match self {
            Self::Exited(0) => GateRunStatus::Passed,
            _ => GateRunStatus::Failed,
        }
    }

    /// Returns the exit code, when the process reported one.
    #[must_use]
    pub const fn exit_code(self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(code),
            Self::Terminated | Self::TimedOut | Self::NotStarted => None,
        }
    }
}

/// Input for recording a new run as `running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGateRun {
    /// Branch under test.
    pub branch: BranchKey,
    /// Gate name.
    pub gate: GateName,
    /// Revision under test.
    pub rev: Revision,
    /// Log file receiving interleaved output.
    pub log_path: Utf8PathBuf,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedGateRunData {
    /// Run identifier.
    pub id: GateRunId,
    /// Branch under test.
    pub branch: BranchKey,
    /// Gate name.
    pub gate: GateName,
    /// Revision under test.
    pub rev: Revision,
    /// Status.
    pub status: GateRunStatus,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Finish timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Exit code.
    pub exit_code: Option<i32>,
    /// Log file path.
    pub log_path: Utf8PathBuf,
}

/// One invocation of a gate against one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRun {
    id: GateRunId,
    branch: BranchKey,
    gate: GateName,
    rev: Revision,
    status: GateRunStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    exit_code: Option<i32>,
    log_path: Utf8PathBuf,
}

impl GateRun {
    /// Materialises a freshly inserted `running` row.
    #[must_use]
    pub fn started(id: GateRunId, data: NewGateRun) -> Self {
        Self {
            id,
            branch: data.branch,
            gate: data.gate,
            rev: data.rev,
            status: GateRunStatus::Running,
            started_at: data.started_at,
            finished_at: None,
            exit_code: None,
            log_path: data.log_path,
        }
    }

    /// Reconstructs a run from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedGateRunData) -> Self {
        Self {
            id: data.id,
            branch: data.branch,
            gate: data.gate,
            rev: data.rev,
            status: data.status,
            started_at: data.started_at,
            finished_at: data.finished_at,
            exit_code: data.exit_code,
            log_path: data.log_path,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn id(&self) -> GateRunId {
        self.id
    }

    /// Returns the branch under test.
    #[must_use]
    pub const fn branch(&self) -> &BranchKey {
        &self.branch
    }

    /// Returns the gate name.
    #[must_use]
    pub const fn gate(&self) -> &GateName {
        &self.gate
    }

    /// Returns the revision under test.
    #[must_use]
    pub const fn rev(&self) -> &Revision {
        &self.rev
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> GateRunStatus {
        self.status
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the finish timestamp.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the exit code.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Returns the log file path.
    #[must_use]
    pub fn log_path(&self) -> &Utf8Path {
        &self.log_path
    }

    /// Returns whether the run passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == GateRunStatus::Passed
    }

    /// Applies the single terminal transition.
    ///
    /// # Errors
    ///
    /// Returns [`GateDomainError::AlreadyFinished`] when the run is already
    /// terminal; the run is left unchanged.
    pub fn finish(&mut self, outcome: GateOutcome, clock: &impl Clock) -> Result<(), GateDomainError> {
        if self.status.is_terminal() {
            return Err(GateDomainError::AlreadyFinished {
                run: self.id,
                status: self.status,
            });
        }
        self.status = outcome.status();
        self.exit_code = outcome.exit_code();
        self.finished_at = Some(clock.utc());
        Ok(())
    }
}
