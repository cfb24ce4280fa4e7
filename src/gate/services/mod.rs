//! Gate runtime service.

mod runtime;

pub use runtime::{GateAssessment, GateBatchReport, GateRuntime, GateRuntimeError, GateRuntimeResult};
