//! Git-backed harness for lifecycle manager tests.
//!
//! Every harness owns a scratch directory holding a bare `origin`
//! repository, the checkout root and the gate log root. Tests that need git
//! fail up front when the binary is unavailable.

use crate::agent::services::AgentLauncher;
use crate::branch::{
    adapters::{GitCli, LocalCheckout, memory::InMemoryBranchRepository},
    domain::{BranchKey, BranchName, Revision},
    ports::{CheckoutPort, GitError, GitPort, GitResult},
    services::{BranchLifecyclePorts, BranchLifecycleService},
};
use crate::events::RecordingEventSink;
use crate::gate::{
    adapters::{
        GATE_CONFIG_FILE, ShellGateExecutor, TomlGateConfigSource, memory::InMemoryGateRunRepository,
    },
    domain::{GateName, NewGateRun},
    ports::GateRunRepository,
    services::GateRuntime,
};
use crate::repo::{
    adapters::memory::InMemoryRepositoryStore,
    domain::{RepoName, Repository},
    ports::RepositoryStore,
};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{NewTaskData, Priority, Task, TaskKey, TaskStatus},
    ports::TaskRepository,
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use mockable::{Clock, DefaultClock};
use std::process::Command;
use std::sync::Arc;

pub(super) const REPO: &str = "acme/widgets";

/// Fails the calling test when no usable `git` binary is on the `PATH`.
pub(super) fn require_git() -> eyre::Result<()> {
    let available = Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    eyre::ensure!(available, "checkout tests need a git binary on the PATH");
    Ok(())
}

/// Runs git synchronously, panicking with its stderr on failure.
pub(super) fn git(dir: &Utf8Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Gantry Tests",
            "-c",
            "user.email=tests@gantry.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_owned()
}

/// Writes `contents` to `file` in `dir` and commits it.
pub(super) fn commit_file(dir: &Utf8Path, file: &str, contents: &str, message: &str) -> Revision {
    std::fs::write(dir.join(file), contents).expect("write file");
    git(dir, &["add", "--all"]);
    git(dir, &["commit", "--quiet", "-m", message]);
    Revision::new(git(dir, &["rev-parse", "HEAD"])).expect("commit revision")
}

pub(super) struct Harness {
    _temp: tempfile::TempDir,
    pub root: Utf8PathBuf,
    pub origin: Utf8PathBuf,
    pub repositories: Arc<InMemoryRepositoryStore>,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub branches: Arc<InMemoryBranchRepository>,
    pub gate_runs: Arc<InMemoryGateRunRepository>,
    pub events: Arc<RecordingEventSink>,
}

impl Harness {
    /// Creates a harness whose origin has an empty `master`.
    pub async fn empty() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 tempdir");
        let origin = root.join("origin.git");
        std::fs::create_dir_all(&origin).expect("create origin");
        git(&origin, &["init", "--bare", "--quiet"]);
        git(&origin, &["symbolic-ref", "HEAD", "refs/heads/master"]);

        let repositories = Arc::new(InMemoryRepositoryStore::new());
        let repository = Repository::new(
            RepoName::new(REPO).expect("repo name"),
            origin.clone(),
            &DefaultClock,
        )
        .expect("repository");
        repositories.insert(&repository).await.expect("register repo");

        Self {
            _temp: temp,
            root,
            origin,
            repositories,
            tasks: Arc::new(InMemoryTaskRepository::new()),
            branches: Arc::new(InMemoryBranchRepository::new()),
            gate_runs: Arc::new(InMemoryGateRunRepository::new()),
            events: Arc::new(RecordingEventSink::new()),
        }
    }

    /// Creates a harness whose `master` declares `gates` as `(name, command)`.
    pub async fn with_gates(gates: &[(&str, &str)]) -> Self {
        let harness = Self::empty().await;
        let config = gates
            .iter()
            .map(|(name, command)| format!("[[gates]]\nname = \"{name}\"\ncommand = \"{command}\"\n"))
            .collect::<String>();
        harness.push_to_master(GATE_CONFIG_FILE, &config, "configure gates");
        harness
    }

    /// Commits a file on `master` through a scratch clone.
    pub fn push_to_master(&self, file: &str, contents: &str, message: &str) -> Revision {
        let scratch = self.root.join(format!("scratch-{}", uuid::Uuid::new_v4()));
        git(&self.root, &["clone", "--quiet", self.origin.as_str(), scratch.as_str()]);
        git(&scratch, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        let rev = commit_file(&scratch, file, contents, message);
        git(&scratch, &["push", "--quiet", "origin", "HEAD:refs/heads/master"]);
        std::fs::remove_dir_all(&scratch).expect("remove scratch clone");
        rev
    }

    pub fn checkouts_root(&self) -> Utf8PathBuf {
        self.root.join("envs")
    }

    pub fn checkout(&self, name: &str) -> Utf8PathBuf {
        let branch = BranchName::new(name).expect("branch name");
        self.checkouts_root()
            .join("acme")
            .join("widgets")
            .join(branch.path_segment())
    }

    pub fn origin_ref(&self, reference: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", reference])
            .current_dir(&self.origin)
            .output()
            .expect("spawn git");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    pub fn key(name: &str) -> BranchKey {
        BranchKey::from_parts(REPO, name).expect("branch key")
    }

    pub async fn add_task(&self, slug: &str, depends_on: &[&str]) -> Task {
        let task = Task::new(
            NewTaskData {
                key: TaskKey::from_parts(REPO, slug).expect("task key"),
                title: format!("Work on {slug}"),
                body: String::new(),
                priority: Priority::default(),
                depends_on: depends_on
                    .iter()
                    .map(|dep| dep.parse().expect("dependency reference"))
                    .collect(),
            },
            &DefaultClock,
        )
        .expect("task");
        self.tasks.insert(&task).await.expect("insert task");
        task
    }

    pub async fn task_status(&self, slug: &str) -> TaskStatus {
        let key = TaskKey::from_parts(REPO, slug).expect("task key");
        self.tasks
            .find(&key)
            .await
            .expect("find task")
            .expect("task exists")
            .status()
    }

    pub async fn gate_runs_for(&self, name: &str) -> usize {
        self.gate_runs
            .list_for_branch(&Self::key(name))
            .await
            .expect("list gate runs")
            .len()
    }

    /// Records a run that never finishes.
    pub async fn start_gate_run(&self, branch: &str, gate: &str, rev: &Revision) {
        self.gate_runs
            .insert(NewGateRun {
                branch: Self::key(branch),
                gate: GateName::new(gate).expect("gate name"),
                rev: rev.clone(),
                log_path: self.root.join("logs").join("interrupted.log"),
                started_at: DefaultClock.utc(),
            })
            .await
            .expect("insert gate run");
    }

    pub fn service(&self) -> BranchLifecycleService<DefaultClock> {
        self.service_with(Arc::new(GitCli::new()), Arc::new(LocalCheckout::new()), None)
    }

    pub fn service_with(
        &self,
        git: Arc<dyn GitPort>,
        checkouts: Arc<dyn CheckoutPort>,
        launcher: Option<Arc<dyn AgentLauncher>>,
    ) -> BranchLifecycleService<DefaultClock> {
        let clock = Arc::new(DefaultClock);
        let gates = GateRuntime::new(
            self.gate_runs.clone(),
            Arc::new(ShellGateExecutor::new()),
            self.events.clone(),
            self.root.join("logs"),
            Arc::clone(&clock),
        );
        let service = BranchLifecycleService::new(
            BranchLifecyclePorts {
                repositories: self.repositories.clone(),
                tasks: self.tasks.clone(),
                branches: self.branches.clone(),
                git,
                checkouts,
                gate_config: Arc::new(TomlGateConfigSource::new()),
                events: self.events.clone(),
            },
            gates,
            self.checkouts_root(),
            clock,
        );
        match launcher {
            Some(launcher) => service.with_agent_launcher(launcher),
            None => service,
        }
    }
}

/// Git adapter whose ref deletion always fails.
pub(super) struct RefDeletionFails(pub GitCli);

#[async_trait]
impl GitPort for RefDeletionFails {
    async fn resolve(&self, path: &Utf8Path, reference: &str) -> GitResult<Option<Revision>> {
        self.0.resolve(path, reference).await
    }

    async fn is_clean(&self, checkout: &Utf8Path) -> GitResult<bool> {
        self.0.is_clean(checkout).await
    }

    async fn fetch(&self, checkout: &Utf8Path) -> GitResult<()> {
        self.0.fetch(checkout).await
    }

    async fn push_branch(
        &self,
        checkout: &Utf8Path,
        branch: &BranchName,
    ) -> GitResult<()> {
        self.0.push_branch(checkout, branch).await
    }

    async fn is_ancestor(
        &self,
        path: &Utf8Path,
        ancestor: &Revision,
        descendant: &Revision,
    ) -> GitResult<bool> {
        self.0.is_ancestor(path, ancestor, descendant).await
    }

    async fn update_ref(
        &self,
        repo: &Utf8Path,
        reference: &str,
        new: &Revision,
        expected_old: Option<&Revision>,
    ) -> GitResult<()> {
        self.0.update_ref(repo, reference, new, expected_old).await
    }

    async fn delete_ref(&self, _repo: &Utf8Path, reference: &str) -> GitResult<()> {
        Err(GitError::CommandFailed {
            command: format!("update-ref -d {reference}"),
            status: "exit status: 1".to_owned(),
            stderr: "cannot lock ref".to_owned(),
        })
    }
}
