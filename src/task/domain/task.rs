//! Task aggregate root and its status state machine.

use super::{ParseTaskStatusError, Priority, TaskDomainError, TaskKey};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is eligible for new work.
    Open,
    /// A branch is actively working on the task.
    InProgress,
    /// Work is stalled waiting for a human.
    NeedsHuman,
    /// Work has landed.
    Closed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::NeedsHuman => "needs_human",
            Self::Closed => "closed",
        }
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns whether a transition to `target` is allowed.
    ///
    /// Returning to `open` from an active status is the one backwards edge;
    /// it makes abandoned work eligible for a retry.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::InProgress)
                | (
                    Self::InProgress,
                    Self::Open | Self::NeedsHuman | Self::Closed
                )
                | (
                    Self::NeedsHuman,
                    Self::Open | Self::InProgress | Self::Closed
                )
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "needs_human" => Ok(Self::NeedsHuman),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    key: TaskKey,
    title: String,
    body: String,
    priority: Priority,
    status: TaskStatus,
    depends_on: Vec<TaskKey>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskData {
    /// Task key.
    pub key: TaskKey,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub body: String,
    /// Priority level.
    pub priority: Priority,
    /// Ordered dependency references.
    pub depends_on: Vec<TaskKey>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task key.
    pub key: TaskKey,
    /// Persisted title.
    pub title: String,
    /// Persisted body.
    pub body: String,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted dependency references, in declaration order.
    pub depends_on: Vec<TaskKey>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new open task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title,
    /// [`TaskDomainError::SelfDependency`] when the task depends on itself and
    /// [`TaskDomainError::DuplicateDependency`] for repeated references.
    pub fn new(data: NewTaskData, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }

        let mut seen = HashSet::new();
        for dependency in &data.depends_on {
            if *dependency == data.key {
                return Err(TaskDomainError::SelfDependency(data.key));
            }
            if !seen.insert(dependency) {
                return Err(TaskDomainError::DuplicateDependency {
                    task: data.key.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        let timestamp = clock.utc();
        Ok(Self {
            key: data.key,
            title: title.to_owned(),
            body: data.body,
            priority: data.priority,
            status: TaskStatus::Open,
            depends_on: data.depends_on,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            key: data.key,
            title: data.title,
            body: data.body,
            priority: data.priority,
            status: data.status,
            depends_on: data.depends_on,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task key.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns dependency references in declaration order.
    #[must_use]
    pub fn depends_on(&self) -> &[TaskKey] {
        &self.depends_on
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks whether the task may move to `target` without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine forbids the move.
    pub fn ensure_can_transition_to(&self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status.can_transition_to(target) {
            return Ok(());
        }
        Err(TaskDomainError::InvalidStatusTransition {
            task: self.key.clone(),
            from: self.status,
            to: target,
        })
    }

    /// Moves the task to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine forbids the move; the task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_can_transition_to(target)?;
        self.status = target;
        self.updated_at = clock.utc();
        Ok(())
    }
}
