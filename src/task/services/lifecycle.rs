//! Service layer for task creation and lookup.

use crate::error::ErrorKind;
use crate::events::{EventSink, FactoryEvent};
use crate::task::{
    domain::{NewTaskData, Priority, Task, TaskDomainError, TaskKey},
    ports::{TaskFilter, TaskRepository, TaskRepositoryError},
    services::{BlockingReport, DependencyResolver},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    repo: String,
    slug: String,
    title: String,
    body: String,
    priority: Option<i64>,
    depends_on: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with required task fields.
    #[must_use]
    pub fn new(repo: impl Into<String>, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            slug: slug.into(),
            title: title.into(),
            body: String::new(),
            priority: None,
            depends_on: Vec::new(),
        }
    }

    /// Sets the task body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the priority level (1..=5).
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets `owner/repo/slug` dependency references, in order.
    #[must_use]
    pub fn with_depends_on(mut self, references: impl IntoIterator<Item = String>) -> Self {
        self.depends_on = references.into_iter().collect();
        self
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// No task exists with the given key.
    #[error("task {0} not found")]
    NotFound(TaskKey),
}

impl TaskServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Repository(TaskRepositoryError::Duplicate(_)) => {
                ErrorKind::PreconditionFailed
            }
            Self::NotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(TaskRepositoryError::Persistence(_)) => {
                ErrorKind::ExternalToolFailure
            }
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task creation and query service.
///
/// Status transitions are deliberately absent: they belong to the branch
/// lifecycle manager.
pub struct TaskService<C>
where
    C: Clock + Send + Sync,
{
    tasks: Arc<dyn TaskRepository>,
    resolver: DependencyResolver,
    events: Arc<dyn EventSink>,
    clock: Arc<C>,
}

impl<C> Clone for TaskService<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            resolver: self.resolver.clone(),
            events: Arc::clone(&self.events),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> TaskService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a task service.
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>, events: Arc<dyn EventSink>, clock: Arc<C>) -> Self {
        Self {
            resolver: DependencyResolver::new(Arc::clone(&tasks)),
            tasks,
            events,
            clock,
        }
    }

    /// Creates a new open task.
    ///
    /// Dependency references are parsed but not required to exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when validation fails and
    /// [`TaskServiceError::Repository`] when the key is taken or the store
    /// fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskServiceResult<Task> {
        let key = TaskKey::from_parts(&request.repo, &request.slug)?;
        let priority = request
            .priority
            .map(Priority::new)
            .transpose()?
            .unwrap_or_default();
        let depends_on = request
            .depends_on
            .iter()
            .map(|reference| reference.parse::<TaskKey>())
            .collect::<Result<Vec<_>, _>>()?;

        let task = Task::new(
            NewTaskData {
                key,
                title: request.title,
                body: request.body,
                priority,
                depends_on,
            },
            &*self.clock,
        )?;
        self.tasks.insert(&task).await?;
        info!(task = %task.key(), priority = %task.priority(), "created task");
        self.events.publish(&FactoryEvent::TaskCreated {
            task: task.key().clone(),
        });
        Ok(task)
    }

    /// Retrieves a task by key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn get(&self, key: &TaskKey) -> TaskServiceResult<Task> {
        self.tasks
            .find(key)
            .await?
            .ok_or_else(|| TaskServiceError::NotFound(key.clone()))
    }

    /// Lists tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list(&self, filter: &TaskFilter) -> TaskServiceResult<Vec<Task>> {
        Ok(self.tasks.list(filter).await?)
    }

    /// Reports which direct dependencies keep a task blocked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn check_blocked(&self, key: &TaskKey) -> TaskServiceResult<BlockingReport> {
        let task = self.get(key).await?;
        Ok(self.resolver.check(&task).await?)
    }
}
