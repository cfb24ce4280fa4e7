//! Domain model for gates and gate runs.

mod error;
mod gate;
mod run;
mod verdict;

pub use error::{GateDomainError, ParseGateRunStatusError};
pub use gate::{Gate, GateName};
pub use run::{GateOutcome, GateRun, GateRunId, GateRunStatus, NewGateRun, PersistedGateRunData};
pub use verdict::GateVerdict;
