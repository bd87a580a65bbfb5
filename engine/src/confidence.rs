//! Plausibility scoring for reconstructed facts.
//!
//! The score is a bounded heuristic, not a probability. It starts from a
//! deficit base and moves with repetition, change size and age, then is
//! clamped to [`MIN_CONFIDENCE`, `MAX_CONFIDENCE`].

use crate::classifier::DiffMetadata;

pub const MIN_CONFIDENCE: f32 = 0.5;
pub const MAX_CONFIDENCE: f32 = 0.95;

const BASE: f32 = 0.5;
const PER_OCCURRENCE: f32 = 0.04;
const MAX_REPETITION_BONUS: f32 = 0.2;
const NOVELTY_PENALTY: f32 = 0.1;
const MAX_AGE_PENALTY: f32 = 0.05;
const AGE_SCALE_MONTHS: f32 = 90.0;
const CONFIG_BONUS: f32 = 0.05;
const TEST_BONUS: f32 = 0.02;

/// Clamp a score into the confidence range.
pub fn clamp_confidence(value: f32) -> f32 {
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Computes bounded confidence from recurrence, magnitude and age.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEstimator;

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Score a fact seen `pattern_occurrences` times before in this run.
    pub fn estimate(
        &self,
        metadata: &DiffMetadata,
        pattern_occurrences: usize,
        months_since_event: f32,
    ) -> f32 {
        let mut score = BASE;

        if pattern_occurrences > 0 {
            score += (pattern_occurrences as f32 * PER_OCCURRENCE).min(MAX_REPETITION_BONUS);
        } else {
            score -= NOVELTY_PENALTY;
        }

        score += Self::size_factor(metadata);
        score -= Self::age_penalty(months_since_event);

        clamp_confidence(score)
    }

    /// Small diffs are weak signals; large ones strengthen the claim.
    fn size_factor(metadata: &DiffMetadata) -> f32 {
        let files = metadata.total_files;
        let lines = metadata.total_lines_changed;

        if files > 20 || lines > 500 {
            0.1
        } else if files > 10 || lines > 200 {
            0.05
        } else if files > 5 || lines > 50 {
            0.0
        } else {
            -0.05
        }
    }

    fn age_penalty(months_since_event: f32) -> f32 {
        (months_since_event.max(0.0) / AGE_SCALE_MONTHS).min(MAX_AGE_PENALTY)
    }

    /// Raise confidence for commits touching config or tests. The
    /// adjustment is never negative, so only the ceiling is re-applied.
    pub fn adjust_for_category(&self, confidence: f32, has_config: bool, has_tests: bool) -> f32 {
        let mut adjusted = confidence;
        if has_config {
            adjusted += CONFIG_BONUS;
        }
        if has_tests {
            adjusted += TEST_BONUS;
        }
        adjusted.min(MAX_CONFIDENCE)
    }
}
