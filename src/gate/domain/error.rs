//! Error types for gate validation and run transitions.

use super::{GateName, GateRunId, GateRunStatus};
use thiserror::Error;

/// Errors returned while constructing gates or finishing runs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateDomainError {
    /// The gate name is empty or contains unsupported characters.
    #[error("invalid gate name '{0}'")]
    InvalidName(String),

    /// The gate command is blank.
    #[error("gate {0} has an empty command")]
    EmptyCommand(GateName),

    /// The run already reached a terminal status.
    #[error("gate run {run} is already {status}")]
    AlreadyFinished {
        /// Run identifier.
        run: GateRunId,
        /// Current status.
        status: GateRunStatus,
    },
}

/// Error returned while parsing gate run statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown gate run status: {0}")]
pub struct ParseGateRunStatusError(pub String);
