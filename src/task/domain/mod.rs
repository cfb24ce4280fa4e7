//! Domain model for tasks.
//!
//! Tasks reference their dependencies by `repo/slug`; references are not
//! validated to exist, so a dangling reference is simply never satisfied.

mod error;
mod ids;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{Priority, TaskKey, TaskSlug};
pub use task::{NewTaskData, PersistedTaskData, Task, TaskStatus};
