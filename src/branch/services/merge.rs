//! Gate-checked fast-forward merge into `master`.

use super::lifecycle::{MASTER_REF, advisory};
use super::{
    BranchLifecycleError, BranchLifecycleResult, BranchLifecycleService, MergeOptions, MergeReport,
};
use crate::branch::domain::{Branch, BranchKey, Revision};
use crate::error::AdvisoryWarning;
use crate::events::FactoryEvent;
use crate::gate::domain::{GateRunStatus, GateVerdict};
use crate::task::domain::TaskStatus;
use camino::Utf8Path;
use mockable::Clock;
use tracing::{debug, info, instrument};

impl<C> BranchLifecycleService<C>
where
    C: Clock + Send + Sync,
{
    /// Lands an active branch on `master` as a fast-forward.
    ///
    /// Unless gates are skipped, every gate the checkout declares must have
    /// passed at the current HEAD. Nothing in the target repository changes
    /// until all checks pass. Once `master` has moved the merge has
    /// succeeded: the branch is marked merged and the remaining cleanup
    /// (branch ref, checkout, task closure) only produces warnings.
    ///
    /// # Errors
    ///
    /// Returns a domain error when the branch is not active,
    /// [`BranchLifecycleError::DirtyWorkingTree`] without `force`, a gate
    /// error naming the first gate that blocks the merge,
    /// [`BranchLifecycleError::NonFastForward`] when `master` has diverged,
    /// and git errors from push or ref update.
    #[instrument(skip_all, fields(branch = %key, force = options.force, skip_gates = options.skip_gates))]
    pub async fn merge(
        &self,
        key: &BranchKey,
        options: MergeOptions,
    ) -> BranchLifecycleResult<MergeReport> {
        let mut branch = self.get(key).await?;
        branch.ensure_active()?;
        let repository = self.repository(key).await?;
        let checkout = branch.environment().path().to_owned();

        if !options.force && !self.ports.git.is_clean(&checkout).await? {
            return Err(BranchLifecycleError::DirtyWorkingTree(key.clone()));
        }
        let head = self.current_head(&branch).await?;
        if options.skip_gates {
            debug!("gate checks skipped");
        } else {
            self.ensure_gates_passed(key, &checkout, &head).await?;
        }

        let master = self.ports.git.resolve(repository.path(), MASTER_REF).await?;
        if let Some(master_rev) = &master {
            self.ensure_fast_forward(key, &checkout, master_rev, &head)
                .await?;
        }
        self.ports.git.push_branch(&checkout, key.name()).await?;
        self.ports
            .git
            .update_ref(repository.path(), MASTER_REF, &head, master.as_ref())
            .await?;
        info!(master_rev = %head.short(), "master advanced");

        let mut warnings = Vec::new();
        branch.mark_merged(head.clone(), &*self.clock)?;
        let recorded = self.ports.branches.update(&branch).await;
        advisory(&mut warnings, "record_merge", recorded);
        self.ports.events.publish(&FactoryEvent::BranchMerged {
            branch: key.clone(),
            master_rev: head.clone(),
        });

        let deleted = self
            .ports
            .git
            .delete_ref(repository.path(), &key.name().ref_name())
            .await;
        advisory(&mut warnings, "delete_branch_ref", deleted);
        let removed = self.ports.checkouts.remove(&checkout).await;
        advisory(&mut warnings, "remove_checkout", removed);
        self.close_task(&branch, &mut warnings).await;

        Ok(MergeReport {
            branch,
            master_rev: head,
            warnings,
        })
    }

    async fn ensure_gates_passed(
        &self,
        key: &BranchKey,
        checkout: &Utf8Path,
        head: &Revision,
    ) -> BranchLifecycleResult<()> {
        let gates = self.ports.gate_config.load(checkout).await?;
        let assessments = self.gates.assess(&gates, key, head).await?;
        for assessment in assessments {
            let gate = assessment.gate.name().clone();
            match assessment.verdict {
                GateVerdict::Passed { .. } => {}
                GateVerdict::NeverRun => {
                    return Err(BranchLifecycleError::GateNeverRun {
                        branch: key.clone(),
                        gate,
                    });
                }
                GateVerdict::Stale { passed_at, .. } => {
                    return Err(BranchLifecycleError::GateStale {
                        gate,
                        passed_at,
                        head: head.clone(),
                    });
                }
                GateVerdict::Failed { run, .. } => {
                    return Err(BranchLifecycleError::GateNotPassed {
                        gate,
                        run,
                        status: GateRunStatus::Failed,
                    });
                }
                GateVerdict::Running { run } => {
                    return Err(BranchLifecycleError::GateNotPassed {
                        gate,
                        run,
                        status: GateRunStatus::Running,
                    });
                }
            }
        }
        debug!(count = gates.len(), "all gates passed at HEAD");
        Ok(())
    }

    async fn ensure_fast_forward(
        &self,
        key: &BranchKey,
        checkout: &Utf8Path,
        master: &Revision,
        head: &Revision,
    ) -> BranchLifecycleResult<()> {
        self.ports.git.fetch(checkout).await?;
        if self.ports.git.is_ancestor(checkout, master, head).await? {
            return Ok(());
        }
        Err(BranchLifecycleError::NonFastForward {
            branch: key.clone(),
            master: master.clone(),
            head: head.clone(),
        })
    }

    async fn close_task(&self, branch: &Branch, warnings: &mut Vec<AdvisoryWarning>) {
        if let Some(task) = branch.task() {
            let closed = self.transition_linked_task(task, TaskStatus::Closed).await;
            advisory(warnings, "close_task", closed);
        }
    }
}
