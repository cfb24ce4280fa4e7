//! Repository-level gate configuration source.

use crate::gate::domain::{Gate, GateDomainError, GateName};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Loads the gates a checkout declares.
#[async_trait]
pub trait GateConfigSource: Send + Sync {
    /// Returns the gates declared by the checkout at `checkout`, in
    /// declaration order. A checkout without configuration has no gates.
    async fn load(&self, checkout: &Utf8Path) -> Result<Vec<Gate>, GateConfigError>;
}

/// Errors raised while loading gate configuration.
#[derive(Debug, Clone, Error)]
pub enum GateConfigError {
    /// The configuration file could not be parsed.
    #[error("invalid gate configuration {path}: {message}")]
    Invalid {
        /// Configuration file.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },

    /// A gate declaration is invalid.
    #[error(transparent)]
    Domain(#[from] GateDomainError),

    /// Two gates share a name.
    #[error("gate {0} is declared more than once")]
    DuplicateName(GateName),

    /// The configuration file could not be read.
    #[error("failed to read gate configuration: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl GateConfigError {
    /// Wraps an I/O failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
