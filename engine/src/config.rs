//! Reconstruction configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors. These are the only errors that stop a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("maxCommits must be greater than zero")]
    NonPositiveMaxCommits,

    #[error("confidenceBaseline must be within [0, 1], got {0}")]
    BaselineOutOfRange(f32),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings accepted by a reconstruction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconstructionConfig {
    /// Upper bound on commits read from the log.
    pub max_commits: usize,
    /// Commits with resolved stats below this many changed lines are
    /// dropped by the scanner unless they touch a config file.
    pub min_lines_changed: usize,
    /// Exclude merge commits from the log.
    pub skip_merges: bool,
    /// Informational; not used in scoring.
    pub confidence_baseline: f32,
    /// Read by downstream decision-record generation, not by this crate.
    #[serde(rename = "generateADRs")]
    pub generate_adrs: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            max_commits: 1000,
            min_lines_changed: 5,
            skip_merges: true,
            confidence_baseline: 0.7,
            generate_adrs: true,
        }
    }
}

impl ReconstructionConfig {
    /// Build a validated configuration with the remaining fields defaulted.
    pub fn new(max_commits: usize, min_lines_changed: usize) -> Result<Self, ConfigError> {
        let config = Self {
            max_commits,
            min_lines_changed,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_commits == 0 {
            return Err(ConfigError::NonPositiveMaxCommits);
        }
        if !(0.0..=1.0).contains(&self.confidence_baseline) {
            return Err(ConfigError::BaselineOutOfRange(self.confidence_baseline));
        }
        Ok(())
    }
}
