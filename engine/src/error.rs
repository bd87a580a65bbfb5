//! Error types for the reconstruction engine.

use crate::classifier::ClassifierError;
use crate::config::ConfigError;
use crate::git_mining::GitMiningError;
use retrograph_memory::MemoryError;
use thiserror::Error;

/// Errors surfaced by the engine's public entry points.
#[derive(Debug, Error)]
pub enum RetroError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Git error: {0}")]
    Git(#[from] GitMiningError),

    #[error("Store error: {0}")]
    Memory(#[from] MemoryError),
}

/// Result type alias for engine operations.
pub type RetroResult<T> = Result<T, RetroError>;
