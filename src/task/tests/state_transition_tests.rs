//! Unit tests for the task status state machine.

use crate::task::domain::{NewTaskData, Priority, Task, TaskDomainError, TaskStatus};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn open_task() -> Task {
    Task::new(
        NewTaskData {
            key: "acme/widgets/fix-1".parse().expect("valid key"),
            title: "Transition test".to_owned(),
            body: String::new(),
            priority: Priority::default(),
            depends_on: Vec::new(),
        },
        &DefaultClock,
    )
    .expect("valid task")
}

#[rstest]
#[case(TaskStatus::Open, TaskStatus::Open, false)]
#[case(TaskStatus::Open, TaskStatus::InProgress, true)]
#[case(TaskStatus::Open, TaskStatus::NeedsHuman, false)]
#[case(TaskStatus::Open, TaskStatus::Closed, false)]
#[case(TaskStatus::InProgress, TaskStatus::Open, true)]
#[case(TaskStatus::InProgress, TaskStatus::InProgress, false)]
#[case(TaskStatus::InProgress, TaskStatus::NeedsHuman, true)]
#[case(TaskStatus::InProgress, TaskStatus::Closed, true)]
#[case(TaskStatus::NeedsHuman, TaskStatus::Open, true)]
#[case(TaskStatus::NeedsHuman, TaskStatus::InProgress, true)]
#[case(TaskStatus::NeedsHuman, TaskStatus::NeedsHuman, false)]
#[case(TaskStatus::NeedsHuman, TaskStatus::Closed, true)]
#[case(TaskStatus::Closed, TaskStatus::Open, false)]
#[case(TaskStatus::Closed, TaskStatus::InProgress, false)]
#[case(TaskStatus::Closed, TaskStatus::NeedsHuman, false)]
#[case(TaskStatus::Closed, TaskStatus::Closed, false)]
fn transition_table(#[case] from: TaskStatus, #[case] to: TaskStatus, #[case] allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
}

#[rstest]
fn only_closed_is_terminal() {
    for status in [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::NeedsHuman,
    ] {
        assert!(!status.is_terminal(), "{status} should not be terminal");
    }
    assert!(TaskStatus::Closed.is_terminal());
}

#[rstest]
fn valid_transition_updates_status_and_timestamp(mut open_task: Task) -> eyre::Result<()> {
    let created = open_task.updated_at();
    open_task.transition_to(TaskStatus::InProgress, &DefaultClock)?;
    eyre::ensure!(open_task.status() == TaskStatus::InProgress);
    eyre::ensure!(open_task.updated_at() >= created);
    Ok(())
}

#[rstest]
fn invalid_transition_leaves_task_unchanged(mut open_task: Task) {
    let before = open_task.clone();

    let result = open_task.transition_to(TaskStatus::Closed, &DefaultClock);

    assert!(matches!(
        result,
        Err(TaskDomainError::InvalidStatusTransition {
            from: TaskStatus::Open,
            to: TaskStatus::Closed,
            ..
        })
    ));
    assert_eq!(open_task, before);
}

#[rstest]
#[case("open", TaskStatus::Open)]
#[case("IN_PROGRESS", TaskStatus::InProgress)]
#[case(" needs_human ", TaskStatus::NeedsHuman)]
#[case("closed", TaskStatus::Closed)]
fn status_parses_from_storage(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw).expect("known status"), expected);
}

#[rstest]
fn unknown_status_is_rejected() {
    let err = TaskStatus::try_from("blocked").expect_err("unknown status");
    assert_eq!(err.0, "blocked");
}
