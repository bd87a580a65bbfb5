//! Recurring pattern detection over synthetic events.
//!
//! Two detectors run over one event stream:
//! - per-category frequency, promoted through a fixed template table
//! - a fixed three-event window scanned over the chronological stream

use chrono::{DateTime, Utc};
use retrograph_memory::{
    CommitCategory, PatternCategory, RetroactivePattern, SyntheticEvent, PROMOTION_THRESHOLD,
};
use std::collections::{BTreeMap, HashSet};

/// Minimum group size for a category template to fire.
pub const MIN_CATEGORY_GROUP: usize = 3;

/// Width of the sequence window.
const WINDOW: usize = 3;

/// Template promoting a frequent category into a pattern.
struct CategoryTemplate {
    category: CommitCategory,
    label: &'static str,
    confidence: f32,
    pattern_category: PatternCategory,
    impact: &'static str,
}

const CATEGORY_TEMPLATES: &[CategoryTemplate] = &[
    CategoryTemplate {
        category: CommitCategory::Feature,
        label: "Feature addition → Refactor cycle",
        confidence: 0.75,
        pattern_category: PatternCategory::Structural,
        impact: "Feature work is regularly followed by structural cleanup",
    },
    CategoryTemplate {
        category: CommitCategory::Config,
        label: "Configuration updates → Stability fixes",
        confidence: 0.78,
        pattern_category: PatternCategory::Contextual,
        impact: "Configuration changes tend to precede stabilization work",
    },
    CategoryTemplate {
        category: CommitCategory::Fix,
        label: "Bug fixes → Test additions",
        confidence: 0.72,
        pattern_category: PatternCategory::Structural,
        impact: "Bug fixes are backed by new tests",
    },
];

const SEQUENCE_LABEL: &str = "Feature/Refactor → Fix → Test cycle";
const SEQUENCE_CONFIDENCE: f32 = 0.80;
const SEQUENCE_IMPACT: &str = "Changes move through build, repair and verification in order";

/// Derives recurring patterns from a run's events.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternInferencer;

impl PatternInferencer {
    pub fn new() -> Self {
        Self
    }

    /// Infer patterns, stamping ids with the current time.
    pub fn infer_patterns(&self, events: &[SyntheticEvent]) -> Vec<RetroactivePattern> {
        self.infer_patterns_at(events, Utc::now())
    }

    /// Infer patterns, stamping ids with `generated_at`.
    ///
    /// `events` are expected in log order, newest first. Events sharing a
    /// timestamp keep their relative log position once reversed.
    pub fn infer_patterns_at(
        &self,
        events: &[SyntheticEvent],
        generated_at: DateTime<Utc>,
    ) -> Vec<RetroactivePattern> {
        let mut chronological: Vec<&SyntheticEvent> = events.iter().rev().collect();
        chronological.sort_by_key(|e| e.timestamp);

        let mut patterns = self.category_patterns(&chronological, generated_at);
        patterns.extend(self.sequence_pattern(&chronological, generated_at));

        tracing::info!(
            "Inferred {} patterns from {} events",
            patterns.len(),
            events.len()
        );
        patterns
    }

    fn category_patterns(
        &self,
        chronological: &[&SyntheticEvent],
        generated_at: DateTime<Utc>,
    ) -> Vec<RetroactivePattern> {
        let mut groups: BTreeMap<CommitCategory, Vec<&SyntheticEvent>> = BTreeMap::new();
        for &event in chronological {
            groups.entry(event.category()).or_default().push(event);
        }

        let mut patterns = Vec::new();
        for template in CATEGORY_TEMPLATES {
            let Some(group) = groups.get(&template.category) else {
                continue;
            };
            if group.len() < MIN_CATEGORY_GROUP {
                continue;
            }
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };

            patterns.push(RetroactivePattern {
                id: RetroactivePattern::derive_id(template.category.as_str(), generated_at),
                pattern: template.label.to_string(),
                frequency: group.len(),
                confidence: template.confidence,
                first_seen: first.timestamp,
                last_seen: last.timestamp,
                evidence_ids: group.iter().map(|e| e.id.clone()).collect(),
                category: template.pattern_category,
                impact: template.impact.to_string(),
            });
        }
        patterns
    }

    fn sequence_pattern(
        &self,
        chronological: &[&SyntheticEvent],
        generated_at: DateTime<Utc>,
    ) -> Option<RetroactivePattern> {
        let matches: Vec<&[&SyntheticEvent]> = chronological
            .windows(WINDOW)
            .filter(|window| is_cycle(window))
            .collect();

        if matches.len() < PROMOTION_THRESHOLD {
            return None;
        }

        let mut seen = HashSet::new();
        let mut evidence_ids = Vec::new();
        for event in matches.iter().flat_map(|window| window.iter()) {
            if seen.insert(event.id.as_str()) {
                evidence_ids.push(event.id.clone());
            }
        }

        let first_seen = matches.first()?.first()?.timestamp;
        let last_seen = matches.last()?.last()?.timestamp;

        Some(RetroactivePattern {
            id: RetroactivePattern::derive_id("sequence", generated_at),
            pattern: SEQUENCE_LABEL.to_string(),
            frequency: matches.len(),
            confidence: SEQUENCE_CONFIDENCE,
            first_seen,
            last_seen,
            evidence_ids,
            category: PatternCategory::Temporal,
            impact: SEQUENCE_IMPACT.to_string(),
        })
    }
}

/// Feature or refactor, then fix, then test.
fn is_cycle(window: &[&SyntheticEvent]) -> bool {
    matches!(
        window,
        [a, b, c]
            if matches!(a.category(), CommitCategory::Feature | CommitCategory::Refactor)
                && b.category() == CommitCategory::Fix
                && c.category() == CommitCategory::Test
    )
}
