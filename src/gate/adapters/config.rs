//! Gate configuration read from a TOML file at the checkout root.
//!
//! ```toml
//! [[gates]]
//! name = "test"
//! command = "cargo test"
//! ```

use crate::fs::open_ambient_dir;
use crate::gate::{
    domain::{Gate, GateName},
    ports::{GateConfigError, GateConfigSource},
};
use async_trait::async_trait;
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::HashSet;
use std::io;
use tracing::debug;

/// File name of the repository-level gate configuration.
pub const GATE_CONFIG_FILE: &str = ".gantry.toml";

#[derive(Debug, Default, Deserialize)]
struct RepoGateFile {
    #[serde(default)]
    gates: Vec<GateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GateEntry {
    name: String,
    command: String,
}

/// Reads gates from [`GATE_CONFIG_FILE`] in the checkout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlGateConfigSource;

impl TomlGateConfigSource {
    /// Creates the configuration source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parses gate configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`GateConfigError`] for malformed TOML, invalid declarations
    /// or duplicate gate names.
    pub fn parse(path: &Utf8Path, contents: &str) -> Result<Vec<Gate>, GateConfigError> {
        let file: RepoGateFile =
            toml::from_str(contents).map_err(|err| GateConfigError::Invalid {
                path: path.to_owned(),
                message: err.message().to_owned(),
            })?;

        let mut seen = HashSet::new();
        let mut gates = Vec::with_capacity(file.gates.len());
        for entry in file.gates {
            let name = GateName::new(entry.name)?;
            if !seen.insert(name.clone()) {
                return Err(GateConfigError::DuplicateName(name));
            }
            gates.push(Gate::new(name, entry.command)?);
        }
        Ok(gates)
    }
}

#[async_trait]
impl GateConfigSource for TomlGateConfigSource {
    async fn load(&self, checkout: &Utf8Path) -> Result<Vec<Gate>, GateConfigError> {
        let path = checkout.join(GATE_CONFIG_FILE);
        let dir = open_ambient_dir(checkout).map_err(GateConfigError::runtime)?;
        let contents = match dir.read_to_string(GATE_CONFIG_FILE) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(checkout = %checkout, "no gate configuration");
                return Ok(Vec::new());
            }
            Err(err) => return Err(GateConfigError::runtime(err)),
        };
        Self::parse(&path, &contents)
    }
}
