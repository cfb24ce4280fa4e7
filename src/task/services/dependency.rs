//! Dependency-blocking resolution.
//!
//! A task is blocked while any of its direct `depends_on` references points at
//! a task that is not `closed`. A reference to a task that does not exist
//! counts as unsatisfied. Dependencies are not followed transitively.

use crate::task::{
    domain::{Task, TaskKey, TaskStatus},
    ports::{TaskRepository, TaskRepositoryResult},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a blocking check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingReport {
    blockers: Vec<TaskKey>,
}

impl BlockingReport {
    /// Creates a report from unsatisfied references.
    #[must_use]
    pub const fn new(blockers: Vec<TaskKey>) -> Self {
        Self { blockers }
    }

    /// Returns whether at least one dependency is unsatisfied.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    /// Returns unsatisfied references in `depends_on` order.
    #[must_use]
    pub fn blockers(&self) -> &[TaskKey] {
        &self.blockers
    }

    /// Consumes the report, returning the unsatisfied references.
    #[must_use]
    pub fn into_blockers(self) -> Vec<TaskKey> {
        self.blockers
    }
}

/// Resolves whether tasks are blocked by their dependencies.
#[derive(Clone)]
pub struct DependencyResolver {
    tasks: Arc<dyn TaskRepository>,
}

impl DependencyResolver {
    /// Creates a resolver reading from `tasks`.
    #[must_use]
    pub const fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    /// Checks the direct dependencies of `task`.
    ///
    /// # Errors
    ///
    /// Returns repository errors from dependency lookups; a missing
    /// dependency is reported as a blocker, not an error.
    pub async fn check(&self, task: &Task) -> TaskRepositoryResult<BlockingReport> {
        let mut blockers = Vec::new();
        for dependency in task.depends_on() {
            let satisfied = self
                .tasks
                .find(dependency)
                .await?
                .is_some_and(|found| found.status() == TaskStatus::Closed);
            if !satisfied {
                blockers.push(dependency.clone());
            }
        }
        debug!(task = %task.key(), blockers = blockers.len(), "resolved dependencies");
        Ok(BlockingReport::new(blockers))
    }
}
