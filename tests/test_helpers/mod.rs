//! Shared git fixtures and service wiring for integration tests.
//!
//! A [`Factory`] owns a scratch directory holding a bare `origin`
//! repository and the factory data directory, and wires every service over
//! the in-memory adapters, the real git adapters and the OS process hosts.

use std::process::Command;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, WrapErr, ensure, eyre};
use gantry::agent::{
    adapters::{OsAgentProcessHost, memory::InMemoryAgentSessionRepository},
    services::{AgentLauncher, AgentSessionService},
};
use gantry::branch::{
    adapters::{GitCli, LocalCheckout, memory::InMemoryBranchRepository},
    domain::BranchKey,
    services::{BranchLifecyclePorts, BranchLifecycleService},
};
use gantry::config::FactoryConfig;
use gantry::events::RecordingEventSink;
use gantry::gate::{
    adapters::{
        GATE_CONFIG_FILE, ShellGateExecutor, TomlGateConfigSource,
        memory::InMemoryGateRunRepository,
    },
    services::GateRuntime,
};
use gantry::repo::{
    adapters::memory::InMemoryRepositoryStore,
    services::{RegisterRepositoryRequest, RepositoryService},
};
use gantry::task::{adapters::memory::InMemoryTaskRepository, services::TaskService};
use gantry::telemetry::init_tracing;
use mockable::DefaultClock;

/// Repository every fixture registers.
pub const REPO: &str = "acme/repo";

/// Fails the calling test when no usable `git` binary is on the `PATH`.
///
/// # Errors
///
/// Returns an error naming the missing prerequisite.
pub fn require_git() -> Result<()> {
    let available = Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());
    ensure!(available, "workflow tests need a git binary on the PATH");
    Ok(())
}

/// Runs git in `dir` with a fixed identity and returns its trimmed stdout.
///
/// # Errors
///
/// Returns an error when git cannot start or exits unsuccessfully.
pub fn git(dir: &Utf8Path, args: &[&str]) -> Result<String> {
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
        .wrap_err("spawn git")?;
    ensure!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Writes `contents` to `file` in `dir`, commits it and returns the new head.
///
/// # Errors
///
/// Returns an error when the file cannot be written or git fails.
pub fn commit_file(dir: &Utf8Path, file: &str, contents: &str, message: &str) -> Result<String> {
    std::fs::write(dir.join(file), contents).wrap_err_with(|| format!("write {file}"))?;
    git(dir, &["add", "--all"])?;
    git(dir, &["commit", "--quiet", "-m", message])?;
    git(dir, &["rev-parse", "HEAD"])
}

/// Fully wired factory over a scratch `origin`.
pub struct Factory {
    _temp: tempfile::TempDir,
    pub root: Utf8PathBuf,
    pub origin: Utf8PathBuf,
    pub config: FactoryConfig,
    pub repositories: RepositoryService<DefaultClock>,
    pub tasks: TaskService<DefaultClock>,
    pub agents: AgentSessionService<DefaultClock>,
    pub branches: BranchLifecycleService<DefaultClock>,
    pub events: Arc<RecordingEventSink>,
}

impl Factory {
    /// Builds a factory whose `master` declares `gates` as `(name, command)`.
    ///
    /// `extra_config` is appended to the generated factory configuration,
    /// typically to declare agent templates.
    ///
    /// # Errors
    ///
    /// Returns an error when the scratch repository cannot be prepared or
    /// the configuration is invalid.
    pub async fn new(gates: &[(&str, &str)], extra_config: &str) -> Result<Self> {
        init_tracing(Some("gantry=debug"));
        let temp = tempfile::tempdir().wrap_err("create tempdir")?;
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf())
            .map_err(|path| eyre!("non UTF-8 tempdir {}", path.display()))?;
        let origin = root.join("origin.git");
        std::fs::create_dir_all(&origin).wrap_err("create origin")?;
        git(&origin, &["init", "--bare", "--quiet"])?;
        git(&origin, &["symbolic-ref", "HEAD", "refs/heads/master"])?;

        let config = FactoryConfig::from_toml_str(&format!(
            "data_dir = \"{}\"\n{extra_config}",
            root.join("data")
        ))?;

        let clock = Arc::new(DefaultClock);
        let events = Arc::new(RecordingEventSink::new());
        let repository_store = Arc::new(InMemoryRepositoryStore::new());
        let task_store = Arc::new(InMemoryTaskRepository::new());

        let repositories = RepositoryService::new(repository_store.clone(), Arc::clone(&clock));
        let tasks = TaskService::new(task_store.clone(), events.clone(), Arc::clone(&clock));
        let agents = AgentSessionService::new(
            Arc::new(InMemoryAgentSessionRepository::new()),
            Arc::new(OsAgentProcessHost::new()),
            config.agents.clone(),
            events.clone(),
            Arc::clone(&clock),
        );
        let gate_runtime = GateRuntime::new(
            Arc::new(InMemoryGateRunRepository::new()),
            Arc::new(ShellGateExecutor::new()),
            events.clone(),
            config.logs_dir(),
            Arc::clone(&clock),
        );
        let launcher: Arc<dyn AgentLauncher> = Arc::new(agents.clone());
        let branches = BranchLifecycleService::new(
            BranchLifecyclePorts {
                repositories: repository_store,
                tasks: task_store,
                branches: Arc::new(InMemoryBranchRepository::new()),
                git: Arc::new(GitCli::new()),
                checkouts: Arc::new(LocalCheckout::new()),
                gate_config: Arc::new(TomlGateConfigSource::new()),
                events: events.clone(),
            },
            gate_runtime,
            config.checkouts_root(),
            clock,
        )
        .with_agent_launcher(launcher);

        repositories
            .register(RegisterRepositoryRequest::new(REPO, origin.clone()))
            .await?;

        let factory = Self {
            _temp: temp,
            root,
            origin,
            config,
            repositories,
            tasks,
            agents,
            branches,
            events,
        };
        if !gates.is_empty() {
            let gate_config = gates
                .iter()
                .map(|(name, command)| {
                    format!("[[gates]]\nname = \"{name}\"\ncommand = \"{command}\"\n")
                })
                .collect::<String>();
            factory.push_to_master(GATE_CONFIG_FILE, &gate_config, "configure gates")?;
        }
        Ok(factory)
    }

    /// Commits a file on `origin`'s `master` through a scratch clone.
    ///
    /// # Errors
    ///
    /// Returns an error when any git step fails.
    pub fn push_to_master(&self, file: &str, contents: &str, message: &str) -> Result<String> {
        let scratch = self.root.join(format!("scratch-{}", uuid::Uuid::new_v4()));
        git(&self.root, &["clone", "--quiet", self.origin.as_str(), scratch.as_str()])?;
        git(&scratch, &["symbolic-ref", "HEAD", "refs/heads/master"])?;
        let rev = commit_file(&scratch, file, contents, message)?;
        git(&scratch, &["push", "--quiet", "origin", "HEAD:refs/heads/master"])?;
        std::fs::remove_dir_all(&scratch).wrap_err("remove scratch clone")?;
        Ok(rev)
    }

    /// Resolves a reference in `origin`, if it exists.
    #[must_use]
    pub fn origin_ref(&self, reference: &str) -> Option<String> {
        git(&self.origin, &["rev-parse", "--verify", "--quiet", reference]).ok()
    }

    /// Default checkout of branch `name`.
    #[must_use]
    pub fn checkout(&self, name: &str) -> Utf8PathBuf {
        let key = Self::key(name).unwrap_or_else(|err| panic!("branch {name}: {err}"));
        self.config.checkout_path(key.repo(), key.name())
    }

    /// Key of branch `name` in the fixture repository.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid branch names.
    pub fn key(name: &str) -> Result<BranchKey> {
        Ok(BranchKey::from_parts(REPO, name)?)
    }
}
