//! Shared world state for the gate-checked branch workflow scenarios.

use gantry::branch::services::{
    BranchLifecycleError, CreateBranchReport, MergeReport,
};
use rstest::fixture;

use crate::test_helpers::Factory;

/// Scenario world for workflow behaviour tests.
#[derive(Default)]
pub struct FactoryWorld {
    pub factory: Option<Factory>,
    pub last_create: Option<Result<CreateBranchReport, BranchLifecycleError>>,
    pub last_merge: Option<Result<MergeReport, BranchLifecycleError>>,
}

impl FactoryWorld {
    /// Returns the wired factory.
    ///
    /// # Errors
    ///
    /// Returns an error when no repository step has run.
    pub fn factory(&self) -> Result<&Factory, eyre::Report> {
        self.factory
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing factory in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> FactoryWorld {
    FactoryWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
