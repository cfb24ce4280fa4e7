//! Factory-level configuration.
//!
//! The factory configuration names where gate logs and checkouts live and
//! which coding agents can be launched. It is read from TOML:
//!
//! ```toml
//! data_dir = "/var/lib/gantry"
//! checkouts_dir = "/var/lib/gantry/envs"
//! log_filter = "gantry=info"
//!
//! [agents.claude]
//! command = "claude -p {{ prompt }}"
//! ```
//!
//! Repository-level gate configuration lives in each checkout and is handled
//! by [`crate::gate::adapters::TomlGateConfigSource`].

use crate::{branch::domain::BranchName, repo::domain::RepoName};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Directory name under `data_dir` holding gate logs.
const LOGS_DIR_NAME: &str = "logs";

/// Directory name under `data_dir` used when `checkouts_dir` is unset.
const DEFAULT_CHECKOUTS_DIR_NAME: &str = "envs";

/// Errors raised while loading factory configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The configuration is not valid TOML for [`FactoryConfig`].
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// An agent command template is empty.
    #[error("agent '{0}' has an empty command template")]
    EmptyAgentCommand(String),
}

/// Shell command template used to launch one kind of coding agent.
///
/// The template is rendered with `minijinja`; `prompt`, `repo`, `branch` and
/// `checkout` are available and already shell-escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCommandTemplate {
    /// Template source, for example `claude -p {{ prompt }}`.
    pub command: String,
}

impl AgentCommandTemplate {
    /// Creates a template from its source text.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Top-level factory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactoryConfig {
    /// Root directory for factory state such as gate logs.
    pub data_dir: Utf8PathBuf,
    /// Root directory for branch checkouts; defaults to `data_dir/envs`.
    pub checkouts_dir: Option<Utf8PathBuf>,
    /// Default tracing filter directive when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// Agent command templates keyed by agent type.
    pub agents: BTreeMap<String, AgentCommandTemplate>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from(".gantry"),
            checkouts_dir: None,
            log_filter: None,
            agents: BTreeMap::new(),
        }
    }
}

impl FactoryConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::EmptyAgentCommand`] for blank agent templates.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the same errors as [`Self::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_owned(),
            source: Arc::new(err),
        })?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some((name, _)) = self
            .agents
            .iter()
            .find(|(_, template)| template.command.trim().is_empty())
        {
            return Err(ConfigError::EmptyAgentCommand(name.clone()));
        }
        Ok(())
    }

    /// Directory holding per-branch gate log directories.
    #[must_use]
    pub fn logs_dir(&self) -> Utf8PathBuf {
        self.data_dir.join(LOGS_DIR_NAME)
    }

    /// Root directory under which checkouts are created by default.
    #[must_use]
    pub fn checkouts_root(&self) -> Utf8PathBuf {
        self.checkouts_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_CHECKOUTS_DIR_NAME))
    }

    /// Default checkout location for a branch of a repository.
    #[must_use]
    pub fn checkout_path(&self, repo: &RepoName, branch: &BranchName) -> Utf8PathBuf {
        default_checkout_path(&self.checkouts_root(), repo, branch)
    }

    /// Returns the agent command template for an agent type, if configured.
    #[must_use]
    pub fn agent_template(&self, agent_type: &str) -> Option<&AgentCommandTemplate> {
        self.agents.get(agent_type)
    }
}

/// Checkout location for `branch` of `repo` under `root`.
///
/// The branch contributes one directory level, see
/// [`BranchName::path_segment`].
#[must_use]
pub fn default_checkout_path(root: &Utf8Path, repo: &RepoName, branch: &BranchName) -> Utf8PathBuf {
    root.join(repo.owner())
        .join(repo.name())
        .join(branch.path_segment())
}
