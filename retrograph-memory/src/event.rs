//! Synthetic event types
//!
//! Core types for representing activity reconstructed from commit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of hash characters kept in event ids and log lines
pub const SHORT_HASH_LEN: usize = 7;

/// Shorten a commit hash for ids and display
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

/// Semantic category of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitCategory {
    Feature,
    Refactor,
    Fix,
    Config,
    Test,
    Docs,
    Unknown,
}

impl CommitCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Fix => "fix",
            Self::Config => "config",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse event type stored alongside observed events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    FileChange,
    DecisionContext,
    ConfigUpdate,
}

impl EventType {
    /// Map a commit category to the event type it is recorded as
    pub fn from_category(category: CommitCategory) -> Self {
        match category {
            CommitCategory::Config => Self::ConfigUpdate,
            CommitCategory::Feature | CommitCategory::Refactor | CommitCategory::Fix => {
                Self::DecisionContext
            }
            CommitCategory::Test | CommitCategory::Docs | CommitCategory::Unknown => {
                Self::FileChange
            }
        }
    }
}

/// Metadata attached to every synthetic event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub category: CommitCategory,
    pub files: Vec<String>,
    pub lines_changed: usize,
    pub author: String,
    /// Plausibility score, always within [0.5, 0.95]
    pub confidence: f32,
    pub synthetic: bool,
    pub commit_hash: String,
    pub reasoning: String,
}

/// An activity record reconstructed from a commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Always `commit:<hash>`
    pub source: String,
    pub metadata: EventMetadata,
}

impl SyntheticEvent {
    /// Build the event for a commit. The id and source are derived from the
    /// commit so re-runs can be traced back to it.
    pub fn from_commit(
        commit_hash: &str,
        timestamp: DateTime<Utc>,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            id: Self::derive_id(timestamp, commit_hash),
            timestamp,
            event_type: EventType::from_category(metadata.category),
            source: format!("commit:{}", commit_hash),
            metadata,
        }
    }

    /// Deterministic id: commit time in milliseconds plus the short hash
    pub fn derive_id(timestamp: DateTime<Utc>, commit_hash: &str) -> String {
        format!(
            "retro-{}-{}",
            timestamp.timestamp_millis(),
            short_hash(commit_hash)
        )
    }

    pub fn category(&self) -> CommitCategory {
        self.metadata.category
    }

    pub fn confidence(&self) -> f32 {
        self.metadata.confidence
    }

    /// UTC day bucket this event is persisted into (`YYYY-MM-DD`)
    pub fn date_key(&self) -> String {
        date_key(self.timestamp)
    }
}

/// Format a timestamp as its UTC day bucket key
pub fn date_key(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
