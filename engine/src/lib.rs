//! Retrograph Engine
//!
//! Reconstructs a workspace's development history from its git log when
//! no directly observed activity has been recorded yet. Commits are
//! classified, scored and turned into synthetic events; recurring
//! behaviors across those events are promoted to patterns. Both are
//! merged into the store used by the memory layer.

pub mod classifier;
pub mod confidence;
pub mod config;
pub mod error;
pub mod git_mining;
pub mod inference;
pub mod orchestrator;
pub mod synthesizer;

pub use classifier::{Classification, CommitClassifier, DiffMetadata, FilePatterns};
pub use confidence::ConfidenceEstimator;
pub use config::{ConfigError, ReconstructionConfig};
pub use error::{RetroError, RetroResult};
pub use inference::PatternInferencer;
pub use orchestrator::{ReconstructionOrchestrator, ReconstructionSummary, DATA_DIR};
pub use synthesizer::EventSynthesizer;
