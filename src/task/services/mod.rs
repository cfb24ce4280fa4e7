//! Application services for tasks.

mod dependency;
mod lifecycle;

pub use dependency::{BlockingReport, DependencyResolver};
pub use lifecycle::{CreateTaskRequest, TaskService, TaskServiceError, TaskServiceResult};
