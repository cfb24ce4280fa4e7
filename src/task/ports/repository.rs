//! Repository port for task persistence and lookup.

use crate::repo::domain::RepoName;
use crate::task::domain::{Task, TaskKey, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Filter for listing tasks. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Restrict to one repository.
    pub repo: Option<RepoName>,
    /// Restrict to one status.
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// Restricts the filter to a repository.
    #[must_use]
    pub fn in_repo(mut self, repo: RepoName) -> Self {
        self.repo = Some(repo);
        self
    }

    /// Restricts the filter to a status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns whether `task` satisfies the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.repo.as_ref().is_none_or(|repo| task.key().repo() == repo)
            && self.status.is_none_or(|status| task.status() == status)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Duplicate`] when the key already exists.
    async fn insert(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists status and timestamp changes to an existing task as one
    /// atomic row update.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by key.
    ///
    /// Returns `None` when the task does not exist.
    async fn find(&self, key: &TaskKey) -> TaskRepositoryResult<Option<Task>>;

    /// Lists tasks matching `filter`, ordered by priority then key.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same key already exists.
    #[error("duplicate task: {0}")]
    Duplicate(TaskKey),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskKey),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
