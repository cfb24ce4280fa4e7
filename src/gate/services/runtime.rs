//! Executes gates and records one immutable run per invocation.

use crate::branch::domain::{BranchKey, Revision};
use crate::error::ErrorKind;
use crate::events::{EventSink, FactoryEvent};
use crate::fs::create_and_open_dir;
use crate::gate::{
    domain::{Gate, GateDomainError, GateName, GateOutcome, GateRun, GateRunId, GateVerdict, NewGateRun},
    ports::{
        GateExecutionError, GateExecutor, GateInvocation, GateRunRepository, GateRunRepositoryError,
    },
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::OpenOptions;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Upper bound on suffixed log names tried when timestamps collide.
const MAX_LOG_NAME_ATTEMPTS: u32 = 1000;

/// Errors that abort a gate invocation.
///
/// A gate command that exits non-zero is not an error; it is a recorded
/// `failed` run.
#[derive(Debug, Error)]
pub enum GateRuntimeError {
    /// The log directory or file could not be created.
    #[error("failed to prepare gate log under {path}: {source}")]
    Log {
        /// Directory or file being created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<io::Error>,
    },

    /// Run history could not be written.
    #[error(transparent)]
    Store(#[from] GateRunRepositoryError),

    /// The run could not be finished.
    #[error(transparent)]
    Domain(#[from] GateDomainError),

    /// The gate command could not be started; the run was recorded as
    /// failed without an exit code.
    #[error("gate run {run}: {source}")]
    Execution {
        /// Run that was finalised as failed.
        run: GateRunId,
        /// Executor error.
        source: GateExecutionError,
    },
}

impl GateRuntimeError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::PreconditionFailed,
            Self::Log { .. } | Self::Store(_) | Self::Execution { .. } => {
                ErrorKind::ExternalToolFailure
            }
        }
    }
}

/// Result type for gate runtime operations.
pub type GateRuntimeResult<T> = Result<T, GateRuntimeError>;

/// Runs recorded by one batch, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateBatchReport {
    runs: Vec<GateRun>,
}

impl GateBatchReport {
    /// Returns every run in the batch.
    #[must_use]
    pub fn runs(&self) -> &[GateRun] {
        &self.runs
    }

    /// Returns whether every gate passed. An empty batch passes.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.runs.iter().all(GateRun::passed)
    }

    /// Returns the runs that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &GateRun> {
        self.runs.iter().filter(|run| !run.passed())
    }
}

/// A configured gate with its latest run and verdict at a given HEAD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateAssessment {
    /// Configured gate.
    pub gate: Gate,
    /// Latest recorded run, if any.
    pub latest: Option<GateRun>,
    /// Verdict against HEAD.
    pub verdict: GateVerdict,
}

/// Gate runtime: prepares logs, records runs and executes gate commands.
pub struct GateRuntime<C>
where
    C: Clock + Send + Sync,
{
    runs: Arc<dyn GateRunRepository>,
    executor: Arc<dyn GateExecutor>,
    events: Arc<dyn EventSink>,
    logs_root: Utf8PathBuf,
    timeout: Option<Duration>,
    clock: Arc<C>,
}

impl<C> Clone for GateRuntime<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            runs: Arc::clone(&self.runs),
            executor: Arc::clone(&self.executor),
            events: Arc::clone(&self.events),
            logs_root: self.logs_root.clone(),
            timeout: self.timeout,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> GateRuntime<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a runtime writing logs under `logs_root`.
    #[must_use]
    pub fn new(
        runs: Arc<dyn GateRunRepository>,
        executor: Arc<dyn GateExecutor>,
        events: Arc<dyn EventSink>,
        logs_root: impl Into<Utf8PathBuf>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            runs,
            executor,
            events,
            logs_root: logs_root.into(),
            timeout: None,
            clock,
        }
    }

    /// Kills gate commands that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the branch-scoped log directory.
    #[must_use]
    pub fn log_dir(&self, branch: &BranchKey) -> Utf8PathBuf {
        self.logs_root
            .join(branch.repo().owner())
            .join(branch.repo().name())
            .join(branch.name().path_segment())
    }

    /// Runs one gate against `rev` in `checkout`.
    ///
    /// The run row is persisted as `running` before the command starts and
    /// finished with one update after it exits.
    ///
    /// # Errors
    ///
    /// Returns [`GateRuntimeError::Log`] or [`GateRuntimeError::Store`] when
    /// the log or run row cannot be written, and
    /// [`GateRuntimeError::Execution`] when the command cannot start.
    pub async fn run_gate(
        &self,
        gate: &Gate,
        branch: &BranchKey,
        rev: &Revision,
        checkout: &Utf8Path,
    ) -> GateRuntimeResult<GateRun> {
        let (run, failure) = self.record_run(gate, branch, rev, checkout).await?;
        match failure {
            Some(source) => Err(GateRuntimeError::Execution {
                run: run.id(),
                source,
            }),
            None => Ok(run),
        }
    }

    /// Runs every gate in order, without stopping at failures.
    ///
    /// A gate whose command cannot start is recorded as failed and the batch
    /// carries on with the remaining gates.
    ///
    /// # Errors
    ///
    /// Returns log and store errors as soon as they occur, since later runs
    /// could not be recorded either. Once every gate has run, returns
    /// [`GateRuntimeError::Execution`] for the first gate that could not
    /// start. Failing gates are not errors.
    pub async fn run_batch(
        &self,
        gates: &[Gate],
        branch: &BranchKey,
        rev: &Revision,
        checkout: &Utf8Path,
    ) -> GateRuntimeResult<GateBatchReport> {
        let mut runs = Vec::with_capacity(gates.len());
        let mut first_failure = None;
        for gate in gates {
            let (run, failure) = self.record_run(gate, branch, rev, checkout).await?;
            if let Some(source) = failure
                && first_failure.is_none()
            {
                first_failure = Some(GateRuntimeError::Execution {
                    run: run.id(),
                    source,
                });
            }
            runs.push(run);
        }
        first_failure.map_or(Ok(GateBatchReport { runs }), Err)
    }

    /// Records and executes one run, returning the finished run together
    /// with the executor error when the command could not start.
    #[instrument(skip_all, fields(branch = %branch, gate = %gate.name(), rev = %rev))]
    async fn record_run(
        &self,
        gate: &Gate,
        branch: &BranchKey,
        rev: &Revision,
        checkout: &Utf8Path,
    ) -> GateRuntimeResult<(GateRun, Option<GateExecutionError>)> {
        let started_at = self.clock.utc();
        let (log_path, log) = self.create_log_file(branch, gate.name(), started_at)?;

        let mut run = self
            .runs
            .insert(NewGateRun {
                branch: branch.clone(),
                gate: gate.name().clone(),
                rev: rev.clone(),
                log_path,
                started_at,
            })
            .await?;
        self.events.publish(&FactoryEvent::GateStarted {
            run: run.id(),
            branch: branch.clone(),
            gate: gate.name().clone(),
            rev: rev.clone(),
        });

        let executed = self
            .executor
            .execute(GateInvocation {
                command: gate.command().to_owned(),
                working_dir: checkout.to_owned(),
                log,
                timeout: self.timeout,
            })
            .await;
        let (outcome, failure) = match executed {
            Ok(outcome) => (outcome, None),
            Err(err) => {
                warn!(run = %run.id(), error = %err, "gate command could not be run");
                (GateOutcome::NotStarted, Some(err))
            }
        };

        run.finish(outcome, &*self.clock)?;
        self.runs.finish(&run).await?;
        info!(
            run = %run.id(),
            status = %run.status(),
            exit_code = ?run.exit_code(),
            "gate run finished"
        );
        self.publish_finished(&run);
        Ok((run, failure))
    }

    /// Returns the latest run of `gate` on `branch`.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn latest_run(
        &self,
        branch: &BranchKey,
        gate: &GateName,
    ) -> GateRuntimeResult<Option<GateRun>> {
        Ok(self.runs.latest(branch, gate).await?)
    }

    /// Lists the run history of `branch` in id order.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn list_runs(&self, branch: &BranchKey) -> GateRuntimeResult<Vec<GateRun>> {
        Ok(self.runs.list_for_branch(branch).await?)
    }

    /// Evaluates each gate's latest run against `head`, in gate order.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub async fn assess(
        &self,
        gates: &[Gate],
        branch: &BranchKey,
        head: &Revision,
    ) -> GateRuntimeResult<Vec<GateAssessment>> {
        let mut assessments = Vec::with_capacity(gates.len());
        for gate in gates {
            let latest = self.runs.latest(branch, gate.name()).await?;
            let verdict = GateVerdict::evaluate(latest.as_ref(), head);
            assessments.push(GateAssessment {
                gate: gate.clone(),
                latest,
                verdict,
            });
        }
        Ok(assessments)
    }

    fn publish_finished(&self, run: &GateRun) {
        let event = if run.passed() {
            FactoryEvent::GatePassed {
                run: run.id(),
                branch: run.branch().clone(),
                gate: run.gate().clone(),
                rev: run.rev().clone(),
            }
        } else {
            FactoryEvent::GateFailed {
                run: run.id(),
                branch: run.branch().clone(),
                gate: run.gate().clone(),
                rev: run.rev().clone(),
                exit_code: run.exit_code(),
            }
        };
        self.events.publish(&event);
    }

    fn create_log_file(
        &self,
        branch: &BranchKey,
        gate: &GateName,
        started_at: DateTime<Utc>,
    ) -> GateRuntimeResult<(Utf8PathBuf, File)> {
        let dir_path = self.log_dir(branch);
        let log_error = |path: &Utf8Path, err: io::Error| GateRuntimeError::Log {
            path: path.to_owned(),
            source: Arc::new(err),
        };
        let dir = create_and_open_dir(&dir_path).map_err(|err| log_error(&dir_path, err))?;

        let stamp = started_at.format("%Y%m%dT%H%M%S%.9fZ");
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        for attempt in 0..MAX_LOG_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{gate}-{stamp}.log")
            } else {
                format!("{gate}-{stamp}-{attempt}.log")
            };
            match dir.open_with(&file_name, &options) {
                Ok(file) => return Ok((dir_path.join(file_name), file.into_std())),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(log_error(&dir_path.join(file_name), err)),
            }
        }
        Err(log_error(
            &dir_path,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free log file name"),
        ))
    }
}
