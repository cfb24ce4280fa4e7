//! Fire-and-forget lifecycle notifications.
//!
//! Services publish [`FactoryEvent`] values to an [`EventSink`] after the
//! state change they describe has been persisted. Publishing is infallible:
//! a sink that cannot deliver an event must swallow the failure so that core
//! behaviour never depends on the presence or health of a subscriber.

use crate::agent::domain::{AgentSessionId, AgentSessionStatus};
use crate::branch::domain::{BranchKey, Revision};
use crate::gate::domain::{GateName, GateRunId};
use crate::task::domain::{TaskKey, TaskStatus};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// Lifecycle notification emitted by the orchestration services.
///
/// Serialises with a `type` tag such as `"branch.merged"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FactoryEvent {
    /// A task was created.
    #[serde(rename = "task.created")]
    TaskCreated {
        /// Task key.
        task: TaskKey,
    },
    /// A task moved between non-terminal statuses.
    #[serde(rename = "task.status_changed")]
    TaskStatusChanged {
        /// Task key.
        task: TaskKey,
        /// Previous status.
        from: TaskStatus,
        /// New status.
        to: TaskStatus,
    },
    /// A task was closed by a merge.
    #[serde(rename = "task.closed")]
    TaskClosed {
        /// Task key.
        task: TaskKey,
    },
    /// A branch and its checkout were created.
    #[serde(rename = "branch.created")]
    BranchCreated {
        /// Branch key.
        branch: BranchKey,
        /// Linked task, if any.
        task: Option<TaskKey>,
    },
    /// A branch was fast-forwarded into `master`.
    #[serde(rename = "branch.merged")]
    BranchMerged {
        /// Branch key.
        branch: BranchKey,
        /// New `master` tip.
        master_rev: Revision,
    },
    /// A branch was abandoned.
    #[serde(rename = "branch.abandoned")]
    BranchAbandoned {
        /// Branch key.
        branch: BranchKey,
    },
    /// A gate run was recorded as running.
    #[serde(rename = "gate.started")]
    GateStarted {
        /// Run identifier.
        run: GateRunId,
        /// Branch the gate runs for.
        branch: BranchKey,
        /// Gate name.
        gate: GateName,
        /// Revision under test.
        rev: Revision,
    },
    /// A gate command exited zero.
    #[serde(rename = "gate.passed")]
    GatePassed {
        /// Run identifier.
        run: GateRunId,
        /// Branch the gate ran for.
        branch: BranchKey,
        /// Gate name.
        gate: GateName,
        /// Revision under test.
        rev: Revision,
    },
    /// A gate command failed or could not be completed.
    #[serde(rename = "gate.failed")]
    GateFailed {
        /// Run identifier.
        run: GateRunId,
        /// Branch the gate ran for.
        branch: BranchKey,
        /// Gate name.
        gate: GateName,
        /// Revision under test.
        rev: Revision,
        /// Exit code, when one was obtained.
        exit_code: Option<i32>,
    },
    /// An agent process was started.
    #[serde(rename = "agent.started")]
    AgentStarted {
        /// Session identifier.
        session: AgentSessionId,
        /// Branch the agent works in.
        branch: BranchKey,
        /// Operating-system process id.
        pid: u32,
    },
    /// An agent session reached a terminal status.
    #[serde(rename = "agent.finished")]
    AgentFinished {
        /// Session identifier.
        session: AgentSessionId,
        /// Terminal status.
        status: AgentSessionStatus,
        /// Recorded exit code.
        exit_code: Option<i32>,
    },
}

impl FactoryEvent {
    /// Returns the dotted event name used as the serialised `type` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskCreated { .. } => "task.created",
            Self::TaskStatusChanged { .. } => "task.status_changed",
            Self::TaskClosed { .. } => "task.closed",
            Self::BranchCreated { .. } => "branch.created",
            Self::BranchMerged { .. } => "branch.merged",
            Self::BranchAbandoned { .. } => "branch.abandoned",
            Self::GateStarted { .. } => "gate.started",
            Self::GatePassed { .. } => "gate.passed",
            Self::GateFailed { .. } => "gate.failed",
            Self::AgentStarted { .. } => "agent.started",
            Self::AgentFinished { .. } => "agent.finished",
        }
    }
}

/// Destination for lifecycle notifications.
pub trait EventSink: Send + Sync {
    /// Delivers `event`. Implementations must not panic or block for long.
    fn publish(&self, event: &FactoryEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: &FactoryEvent) {}
}

/// Sink that logs every event at `info` level with a JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &FactoryEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(event = event.name(), %payload, "factory event"),
            Err(err) => warn!(event = event.name(), error = %err, "failed to encode event"),
        }
    }
}

/// Sink that keeps every event in memory, in publication order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<FactoryEvent>>,
}

impl RecordingEventSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<FactoryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the names of the recorded events.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(FactoryEvent::name)
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &FactoryEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
