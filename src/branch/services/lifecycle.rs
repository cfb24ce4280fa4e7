//! Branch creation, abandonment, gate runs and queries.

use super::{
    AbandonOptions, AbandonReport, BranchLifecycleError, BranchLifecycleResult,
    CreateBranchReport, CreateBranchRequest, GateStatusReport,
};
use crate::agent::{
    domain::AgentSession,
    services::{AgentLauncher, LaunchAgentRequest},
};
use crate::branch::{
    domain::{Branch, BranchKey, BranchStatus, Environment, NewBranchData, Revision},
    ports::{BranchFilter, BranchRepository, CheckoutPort, GitPort},
};
use crate::config::default_checkout_path;
use crate::error::AdvisoryWarning;
use crate::events::{EventSink, FactoryEvent};
use crate::gate::{
    domain::Gate,
    ports::GateConfigSource,
    services::{GateBatchReport, GateRuntime},
};
use crate::repo::{domain::Repository, ports::RepositoryStore};
use crate::task::{
    domain::{Task, TaskKey, TaskStatus},
    ports::TaskRepository,
    services::DependencyResolver,
};
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Reference resolved to the `master` tip of a repository.
pub(super) const MASTER_REF: &str = "refs/heads/master";

/// Collaborators of the branch lifecycle manager.
#[derive(Clone)]
pub struct BranchLifecyclePorts {
    /// Registered target repositories.
    pub repositories: Arc<dyn RepositoryStore>,
    /// Task store.
    pub tasks: Arc<dyn TaskRepository>,
    /// Branch store.
    pub branches: Arc<dyn BranchRepository>,
    /// Git collaborator.
    pub git: Arc<dyn GitPort>,
    /// Checkout collaborator.
    pub checkouts: Arc<dyn CheckoutPort>,
    /// Repo-level gate configuration.
    pub gate_config: Arc<dyn GateConfigSource>,
    /// Event sink.
    pub events: Arc<dyn EventSink>,
}

/// Orchestrates branch state transitions and the task status they imply.
pub struct BranchLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    pub(super) ports: BranchLifecyclePorts,
    pub(super) gates: GateRuntime<C>,
    pub(super) agents: Option<Arc<dyn AgentLauncher>>,
    pub(super) resolver: DependencyResolver,
    pub(super) checkouts_root: Utf8PathBuf,
    pub(super) clock: Arc<C>,
}

impl<C> Clone for BranchLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            ports: self.ports.clone(),
            gates: self.gates.clone(),
            agents: self.agents.clone(),
            resolver: self.resolver.clone(),
            checkouts_root: self.checkouts_root.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> BranchLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle manager placing default checkouts under
    /// `checkouts_root`.
    #[must_use]
    pub fn new(
        ports: BranchLifecyclePorts,
        gates: GateRuntime<C>,
        checkouts_root: impl Into<Utf8PathBuf>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            resolver: DependencyResolver::new(Arc::clone(&ports.tasks)),
            ports,
            gates,
            agents: None,
            checkouts_root: checkouts_root.into(),
            clock,
        }
    }

    /// Enables agent launches on branch creation.
    #[must_use]
    pub fn with_agent_launcher(mut self, launcher: Arc<dyn AgentLauncher>) -> Self {
        self.agents = Some(launcher);
        self
    }

    /// Creates an active branch with its own checkout cut from `master`.
    ///
    /// Every precondition, including the linked task's dependency check, is
    /// evaluated before the checkout is created. A failure after the
    /// checkout exists removes it again. When an agent is requested the call
    /// returns only after the agent exits.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error for a missing repository or task,
    /// [`BranchLifecycleError::AlreadyExists`] for a taken key,
    /// [`BranchLifecycleError::CheckoutOverlap`] when the checkout would
    /// nest with an active branch's checkout,
    /// [`BranchLifecycleError::TaskBlocked`] with every blocker for a blocked
    /// task, and git or store errors.
    #[instrument(skip_all, fields(repo = %request.repo, branch = %request.name))]
    pub async fn create(
        &self,
        request: CreateBranchRequest,
    ) -> BranchLifecycleResult<CreateBranchReport> {
        let key = BranchKey::from_parts(&request.repo, &request.name)?;
        let repository = self.repository(&key).await?;
        if self.ports.branches.find(&key).await?.is_some() {
            return Err(BranchLifecycleError::AlreadyExists(key));
        }
        let agent_launcher = match (&request.agent, &self.agents) {
            (Some(_), None) => return Err(BranchLifecycleError::AgentsUnavailable),
            (_, launcher) => launcher.clone(),
        };
        let task = match request.task.as_deref() {
            Some(reference) => Some(self.claimable_task(&key, reference).await?),
            None => None,
        };

        let checkout = request
            .environment
            .path
            .clone()
            .unwrap_or_else(|| default_checkout_path(&self.checkouts_root, key.repo(), key.name()));
        self.ensure_checkout_is_free(&checkout).await?;
        let base_rev = self.ports.git.resolve(repository.path(), MASTER_REF).await?;
        self.ports
            .checkouts
            .create(repository.path(), key.name(), base_rev.as_ref(), &checkout)
            .await?;

        let data = NewBranchData {
            key: key.clone(),
            base_rev,
            head_rev: None,
            environment: Environment::new(request.environment.backend, checkout.clone()),
            task: task.as_ref().map(|claimed| claimed.key().clone()),
        };
        let branch = match self.record_branch(data, &checkout).await {
            Ok(branch) => branch,
            Err(err) => {
                self.discard_checkout(&checkout).await;
                return Err(err);
            }
        };
        info!(
            checkout = %checkout,
            base_rev = ?branch.base_rev().map(Revision::short),
            "created branch"
        );
        self.ports.events.publish(&FactoryEvent::BranchCreated {
            branch: key.clone(),
            task: branch.task().cloned(),
        });

        if let Some(claimed) = task {
            self.move_task(claimed, TaskStatus::InProgress).await?;
        }

        let session = match (request.agent, agent_launcher) {
            (Some(agent), Some(launcher)) => Some(
                self.launch_agent(launcher.as_ref(), &key, agent.agent_type, agent.prompt, checkout)
                    .await?,
            ),
            _ => None,
        };
        Ok(CreateBranchReport { branch, session })
    }

    /// Abandons an active branch, removes its checkout and reopens the linked
    /// task.
    ///
    /// # Errors
    ///
    /// Returns [`BranchLifecycleError::ConfirmationRequired`] when neither
    /// forced nor confirmed, a domain error when the branch is not active, and
    /// store errors while recording the new status. Cleanup failures are
    /// reported as warnings.
    #[instrument(skip_all, fields(branch = %key))]
    pub async fn abandon(
        &self,
        key: &BranchKey,
        options: AbandonOptions,
    ) -> BranchLifecycleResult<AbandonReport> {
        let mut branch = self.get(key).await?;
        branch.ensure_active()?;
        if !options.force && !options.confirmed {
            return Err(BranchLifecycleError::ConfirmationRequired(key.clone()));
        }

        branch.mark_abandoned(&*self.clock)?;
        self.ports.branches.update(&branch).await?;
        info!("abandoned branch");
        self.ports
            .events
            .publish(&FactoryEvent::BranchAbandoned { branch: key.clone() });

        let mut warnings = Vec::new();
        let removed = self
            .ports
            .checkouts
            .remove(branch.environment().path())
            .await;
        advisory(&mut warnings, "remove_checkout", removed);
        if let Some(task) = branch.task() {
            let reopened = self.transition_linked_task(task, TaskStatus::Open).await;
            advisory(&mut warnings, "reopen_task", reopened);
        }
        Ok(AbandonReport { branch, warnings })
    }

    /// Runs the checkout's gates against its current HEAD, every gate to
    /// completion, in configuration order.
    ///
    /// `selection` restricts the batch to the named gates.
    ///
    /// # Errors
    ///
    /// Returns [`BranchLifecycleError::GateNotConfigured`] for an unknown
    /// selected gate before anything runs, and gate runtime errors.
    #[instrument(skip_all, fields(branch = %key))]
    pub async fn run_gates(
        &self,
        key: &BranchKey,
        selection: Option<&[String]>,
    ) -> BranchLifecycleResult<GateBatchReport> {
        let branch = self.get(key).await?;
        branch.ensure_active()?;
        let checkout = branch.environment().path();
        let head = self.current_head(&branch).await?;
        let configured = self.ports.gate_config.load(checkout).await?;
        let gates = select_gates(key, configured, selection)?;
        debug!(count = gates.len(), head = %head.short(), "running gates");
        let report = self.gates.run_batch(&gates, key, &head, checkout).await?;
        info!(all_passed = report.all_passed(), "gate batch finished");
        Ok(report)
    }

    /// Evaluates every configured gate against the branch's current HEAD,
    /// using the same rules as [`Self::merge`].
    ///
    /// # Errors
    ///
    /// Returns a domain error when the branch is not active, and git, config
    /// or store errors.
    pub async fn gate_status(&self, key: &BranchKey) -> BranchLifecycleResult<GateStatusReport> {
        let branch = self.get(key).await?;
        branch.ensure_active()?;
        let head = self.current_head(&branch).await?;
        let configured = self
            .ports
            .gate_config
            .load(branch.environment().path())
            .await?;
        let gates = self.gates.assess(&configured, key, &head).await?;
        Ok(GateStatusReport { head, gates })
    }

    /// Escalates the branch's task to a human.
    ///
    /// # Errors
    ///
    /// Returns [`BranchLifecycleError::NoLinkedTask`] when the branch has no
    /// task, and a task domain error when the task is not in progress.
    pub async fn flag_needs_human(&self, key: &BranchKey) -> BranchLifecycleResult<Task> {
        self.transition_active_task(key, TaskStatus::NeedsHuman).await
    }

    /// Hands an escalated task back to the branch's agent.
    ///
    /// # Errors
    ///
    /// Returns [`BranchLifecycleError::NoLinkedTask`] when the branch has no
    /// task, and a task domain error when the task is not awaiting a human.
    pub async fn resume_task(&self, key: &BranchKey) -> BranchLifecycleResult<Task> {
        self.transition_active_task(key, TaskStatus::InProgress).await
    }

    /// Retrieves a branch.
    ///
    /// # Errors
    ///
    /// Returns [`BranchLifecycleError::BranchNotFound`] when missing.
    pub async fn get(&self, key: &BranchKey) -> BranchLifecycleResult<Branch> {
        self.ports
            .branches
            .find(key)
            .await?
            .ok_or_else(|| BranchLifecycleError::BranchNotFound(key.clone()))
    }

    /// Lists branches matching `filter`, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list(&self, filter: &BranchFilter) -> BranchLifecycleResult<Vec<Branch>> {
        Ok(self.ports.branches.list(filter).await?)
    }

    pub(super) async fn repository(&self, key: &BranchKey) -> BranchLifecycleResult<Repository> {
        self.ports
            .repositories
            .find(key.repo())
            .await?
            .ok_or_else(|| BranchLifecycleError::RepositoryNotFound(key.repo().clone()))
    }

    pub(super) async fn current_head(&self, branch: &Branch) -> BranchLifecycleResult<Revision> {
        self.ports
            .git
            .resolve(branch.environment().path(), "HEAD")
            .await?
            .ok_or_else(|| BranchLifecycleError::NoCommits(branch.key().clone()))
    }

    /// Moves a linked task and publishes the change.
    pub(super) async fn transition_linked_task(
        &self,
        key: &TaskKey,
        target: TaskStatus,
    ) -> BranchLifecycleResult<Task> {
        let task = self
            .ports
            .tasks
            .find(key)
            .await?
            .ok_or_else(|| BranchLifecycleError::TaskNotFound(key.clone()))?;
        self.move_task(task, target).await
    }

    async fn claimable_task(&self, branch: &BranchKey, reference: &str) -> BranchLifecycleResult<Task> {
        let key = if reference.contains('/') {
            reference.parse::<TaskKey>()?
        } else {
            TaskKey::from_parts(branch.repo().as_str(), reference)?
        };
        let task = self
            .ports
            .tasks
            .find(&key)
            .await?
            .ok_or_else(|| BranchLifecycleError::TaskNotFound(key.clone()))?;
        let report = self.resolver.check(&task).await?;
        if report.is_blocked() {
            warn!(task = %key, blockers = report.blockers().len(), "task is blocked");
            return Err(BranchLifecycleError::TaskBlocked {
                task: key,
                blockers: report.into_blockers(),
            });
        }
        task.ensure_can_transition_to(TaskStatus::InProgress)?;
        Ok(task)
    }

    async fn ensure_checkout_is_free(&self, checkout: &Utf8Path) -> BranchLifecycleResult<()> {
        let active = self
            .ports
            .branches
            .list(&BranchFilter::default().with_status(BranchStatus::Active))
            .await?;
        let overlapping = active.into_iter().find(|branch| {
            let held = branch.environment().path();
            held.starts_with(checkout) || checkout.starts_with(held)
        });
        overlapping.map_or(Ok(()), |holder| {
            Err(BranchLifecycleError::CheckoutOverlap {
                path: checkout.to_owned(),
                holder: holder.key().clone(),
            })
        })
    }

    async fn record_branch(
        &self,
        mut data: NewBranchData,
        checkout: &Utf8Path,
    ) -> BranchLifecycleResult<Branch> {
        data.head_rev = self.ports.git.resolve(checkout, "HEAD").await?;
        let branch = Branch::new(data, &*self.clock);
        self.ports.branches.insert(&branch).await?;
        Ok(branch)
    }

    async fn discard_checkout(&self, checkout: &Utf8Path) {
        if let Err(err) = self.ports.checkouts.remove(checkout).await {
            warn!(checkout = %checkout, error = %err, "failed to remove checkout after aborted create");
        }
    }

    async fn launch_agent(
        &self,
        launcher: &dyn AgentLauncher,
        branch: &BranchKey,
        agent_type: String,
        prompt: String,
        checkout: Utf8PathBuf,
    ) -> BranchLifecycleResult<AgentSession> {
        let session = launcher
            .launch(LaunchAgentRequest {
                branch: branch.clone(),
                agent_type,
                prompt,
                checkout,
            })
            .await?;
        info!(
            session = %session.id(),
            status = %session.status(),
            exit_code = ?session.exit_code(),
            "agent session finished"
        );
        Ok(session)
    }

    async fn transition_active_task(
        &self,
        key: &BranchKey,
        target: TaskStatus,
    ) -> BranchLifecycleResult<Task> {
        let branch = self.get(key).await?;
        branch.ensure_active()?;
        let task = branch
            .task()
            .ok_or_else(|| BranchLifecycleError::NoLinkedTask(key.clone()))?;
        self.transition_linked_task(task, target).await
    }

    async fn move_task(&self, mut task: Task, target: TaskStatus) -> BranchLifecycleResult<Task> {
        let from = task.status();
        task.transition_to(target, &*self.clock)?;
        self.ports.tasks.update(&task).await?;
        info!(task = %task.key(), from = %from, to = %target, "task status changed");
        let event = if target == TaskStatus::Closed {
            FactoryEvent::TaskClosed {
                task: task.key().clone(),
            }
        } else {
            FactoryEvent::TaskStatusChanged {
                task: task.key().clone(),
                from,
                to: target,
            }
        };
        self.ports.events.publish(&event);
        Ok(task)
    }
}

/// Records a failed best-effort step.
pub(super) fn advisory<T, E>(warnings: &mut Vec<AdvisoryWarning>, step: &str, result: Result<T, E>)
where
    E: fmt::Display,
{
    if let Err(err) = result {
        warn!(step, error = %err, "cleanup step failed");
        warnings.push(AdvisoryWarning::new(step, err.to_string()));
    }
}

fn select_gates(
    branch: &BranchKey,
    configured: Vec<Gate>,
    selection: Option<&[String]>,
) -> BranchLifecycleResult<Vec<Gate>> {
    let Some(names) = selection else {
        return Ok(configured);
    };
    if let Some(unknown) = names
        .iter()
        .find(|name| !configured.iter().any(|gate| gate.name().as_str() == name.as_str()))
    {
        return Err(BranchLifecycleError::GateNotConfigured {
            branch: branch.clone(),
            gate: unknown.clone(),
        });
    }
    Ok(configured
        .into_iter()
        .filter(|gate| names.iter().any(|name| name == gate.name().as_str()))
        .collect())
}
