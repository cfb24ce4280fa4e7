//! Requests and reports exchanged with the branch lifecycle manager.

use crate::agent::domain::AgentSession;
use crate::branch::domain::{Branch, EnvironmentSpec, Revision};
use crate::error::AdvisoryWarning;
use crate::gate::services::GateAssessment;
use serde::Serialize;

/// Agent to launch once a branch checkout exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    /// Configured agent type.
    pub agent_type: String,
    /// Prompt handed to the agent.
    pub prompt: String,
}

/// Request payload for creating a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBranchRequest {
    pub(super) repo: String,
    pub(super) name: String,
    pub(super) environment: EnvironmentSpec,
    pub(super) task: Option<String>,
    pub(super) agent: Option<AgentRequest>,
}

impl CreateBranchRequest {
    /// Creates a request for branch `name` of repository `repo`.
    #[must_use]
    pub fn new(repo: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            name: name.into(),
            environment: EnvironmentSpec::default(),
            task: None,
            agent: None,
        }
    }

    /// Places the checkout explicitly.
    #[must_use]
    pub fn with_environment(mut self, environment: EnvironmentSpec) -> Self {
        self.environment = environment;
        self
    }

    /// Links a task, given as a slug in the same repository or as a full
    /// `owner/repo/slug` reference.
    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Launches an agent in the new checkout before returning.
    #[must_use]
    pub fn with_agent(mut self, agent_type: impl Into<String>, prompt: impl Into<String>) -> Self {
        self.agent = Some(AgentRequest {
            agent_type: agent_type.into(),
            prompt: prompt.into(),
        });
        self
    }
}

/// Outcome of branch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBranchReport {
    /// The new active branch.
    pub branch: Branch,
    /// Reaped agent session, when one was requested.
    pub session: Option<AgentSession>,
}

/// Flags controlling a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Merge even when the checkout has uncommitted changes.
    pub force: bool,
    /// Do not require passing gates.
    pub skip_gates: bool,
}

/// Outcome of a merge. Warnings list cleanup steps that failed after
/// `master` moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// The branch, marked merged.
    pub branch: Branch,
    /// New `master` tip.
    pub master_rev: Revision,
    /// Failed cleanup steps.
    pub warnings: Vec<AdvisoryWarning>,
}

/// Flags controlling abandonment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbandonOptions {
    /// Skip the confirmation requirement.
    pub force: bool,
    /// The caller confirmed the abandonment.
    pub confirmed: bool,
}

/// Outcome of abandoning a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbandonReport {
    /// The branch, marked abandoned.
    pub branch: Branch,
    /// Failed cleanup steps.
    pub warnings: Vec<AdvisoryWarning>,
}

/// Per-gate verdicts for a branch at its current HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateStatusReport {
    /// Checkout HEAD the verdicts were evaluated against.
    pub head: Revision,
    /// One assessment per configured gate, in configuration order.
    pub gates: Vec<GateAssessment>,
}

impl GateStatusReport {
    /// Returns whether every gate would allow a merge.
    #[must_use]
    pub fn mergeable(&self) -> bool {
        self.gates
            .iter()
            .all(|assessment| assessment.verdict.allows_merge())
    }
}
