//! Branch lifecycle manager.

mod error;
mod lifecycle;
mod merge;
mod reports;

pub use error::{BranchLifecycleError, BranchLifecycleResult};
pub use lifecycle::{BranchLifecyclePorts, BranchLifecycleService};
pub use reports::{
    AbandonOptions, AbandonReport, AgentRequest, CreateBranchReport, CreateBranchRequest,
    GateStatusReport, MergeOptions, MergeReport,
};
