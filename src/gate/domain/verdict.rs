//! Mergeability verdict for a single gate.

use super::{GateRun, GateRunId, GateRunStatus};
use crate::branch::domain::Revision;
use serde::{Deserialize, Serialize};

/// Whether a gate's latest run satisfies a merge at a given HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateVerdict {
    /// The latest run passed at HEAD.
    Passed {
        /// Run that passed.
        run: GateRunId,
    },
    /// The latest run passed, but at an older revision.
    Stale {
        /// Run that passed.
        run: GateRunId,
        /// Revision it passed at.
        passed_at: Revision,
    },
    /// The latest run failed.
    Failed {
        /// Run that failed.
        run: GateRunId,
        /// Exit code, when one was recorded.
        exit_code: Option<i32>,
    },
    /// The latest run has not finished.
    Running {
        /// Run in progress.
        run: GateRunId,
    },
    /// The gate has never been run on this branch.
    NeverRun,
}

impl GateVerdict {
    /// Evaluates the latest run of a gate against `head`.
    ///
    /// Only the latest run counts; an older passing run never rescues a newer
    /// failure.
    #[must_use]
    pub fn evaluate(latest: Option<&GateRun>, head: &Revision) -> Self {
        let Some(run) = latest else {
            return Self::NeverRun;
        };
        match run.status() {
            GateRunStatus::Passed if run.rev() == head => Self::Passed { run: run.id() },
            GateRunStatus::Passed => Self::Stale {
                run: run.id(),
                passed_at: run.rev().clone(),
            },
            GateRunStatus::Failed => Self::Failed {
                run: run.id(),
                exit_code: run.exit_code(),
            },
            GateRunStatus::Pending | GateRunStatus::Running => Self::Running { run: run.id() },
        }
    }

    /// Returns whether the gate allows a merge.
    #[must_use]
    pub const fn allows_merge(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}
