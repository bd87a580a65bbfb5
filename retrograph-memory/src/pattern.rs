//! Recurring pattern records inferred from synthetic events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum number of occurrences before a pattern is promoted
pub const PROMOTION_THRESHOLD: usize = 2;

/// Broad family a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    /// Shape of the code changes themselves
    Structural,
    /// Changes driven by the surrounding project setup
    Contextual,
    /// Ordered sequences of work over time
    Temporal,
}

/// A behavioral pattern backed by synthetic events from the same run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroactivePattern {
    pub id: String,
    pub pattern: String,
    /// Occurrence or window count, never below [`PROMOTION_THRESHOLD`]
    pub frequency: usize,
    /// Fixed per template
    pub confidence: f32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub evidence_ids: Vec<String>,
    pub category: PatternCategory,
    pub impact: String,
}

impl RetroactivePattern {
    /// Build the id for a pattern emitted at `generated_at`
    pub fn derive_id(slug: &str, generated_at: DateTime<Utc>) -> String {
        format!("retro-pattern-{}-{}", slug, generated_at.timestamp_millis())
    }

    /// Check that every evidence id refers to one of `known_ids`
    pub fn evidence_resolves(&self, mut known_ids: impl FnMut(&str) -> bool) -> bool {
        self.evidence_ids.iter().all(|id| known_ids(id))
    }
}
