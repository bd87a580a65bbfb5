//! Turns scanned commits into synthetic events.

use crate::classifier::CommitClassifier;
use crate::confidence::{clamp_confidence, ConfidenceEstimator};
use crate::git_mining::Commit;
use chrono::{DateTime, Utc};
use retrograph_memory::temporal::DEFAULT_MAX_MONTHS;
use retrograph_memory::{
    months_between, short_hash, CommitCategory, EventMetadata, SyntheticEvent, TemporalWeighter,
};
use std::collections::{BTreeMap, HashMap};

/// Key under which repeated shapes of change are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub category: CommitCategory,
    pub file_count: usize,
}

/// Occurrence counts scoped to one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceCounter {
    counts: HashMap<PatternKey, usize>,
}

impl OccurrenceCounter {
    /// How many times `key` has been seen so far.
    pub fn occurrences(&self, key: &PatternKey) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Counter with one more occurrence of `key`.
    pub fn record(mut self, key: PatternKey) -> Self {
        *self.counts.entry(key).or_insert(0) += 1;
        self
    }
}

/// Orchestrates classification, scoring and decay per commit.
pub struct EventSynthesizer {
    classifier: CommitClassifier,
    estimator: ConfidenceEstimator,
    weighter: TemporalWeighter,
    max_age_months: f32,
}

impl EventSynthesizer {
    pub fn new(classifier: CommitClassifier, weighter: TemporalWeighter) -> Self {
        Self {
            classifier,
            estimator: ConfidenceEstimator::new(),
            weighter,
            max_age_months: DEFAULT_MAX_MONTHS,
        }
    }

    /// Override the age beyond which commits are skipped.
    pub fn with_max_age_months(mut self, months: f32) -> Self {
        self.max_age_months = months;
        self
    }

    /// Synthesize events relative to the current time.
    pub fn synthesize_events(&self, commits: &[Commit]) -> Vec<SyntheticEvent> {
        self.synthesize_events_at(commits, Utc::now())
    }

    /// Synthesize events in log order, measuring age from `reference`.
    ///
    /// The occurrence counter is threaded through a fold so each event only
    /// sees the commits before it in this call.
    pub fn synthesize_events_at(
        &self,
        commits: &[Commit],
        reference: DateTime<Utc>,
    ) -> Vec<SyntheticEvent> {
        let (_, events) = commits.iter().fold(
            (OccurrenceCounter::default(), Vec::new()),
            |(counter, mut events), commit| {
                let (counter, event) = self.synthesize_one(counter, commit, reference);
                events.extend(event);
                (counter, events)
            },
        );

        tracing::info!(
            "Synthesized {} events from {} commits",
            events.len(),
            commits.len()
        );
        events
    }

    /// Process one commit, returning the updated counter and maybe an event.
    pub fn synthesize_one(
        &self,
        counter: OccurrenceCounter,
        commit: &Commit,
        reference: DateTime<Utc>,
    ) -> (OccurrenceCounter, Option<SyntheticEvent>) {
        if self
            .weighter
            .is_too_old(commit.timestamp, reference, self.max_age_months)
        {
            tracing::debug!(
                "Skipping {}: older than {} months",
                short_hash(&commit.hash),
                self.max_age_months
            );
            return (counter, None);
        }

        let classification =
            self.classifier
                .classify(&commit.message, &commit.files, commit.lines_changed());
        let metadata =
            self.classifier
                .extract_metadata(&commit.files, commit.insertions, commit.deletions);

        if !self.classifier.is_significant(&metadata) {
            tracing::debug!(
                "Skipping {}: insignificant ({} files, {} lines)",
                short_hash(&commit.hash),
                metadata.total_files,
                metadata.total_lines_changed
            );
            return (counter, None);
        }

        let key = PatternKey {
            category: classification.category,
            file_count: metadata.total_files,
        };
        let occurrences = counter.occurrences(&key);
        let months = months_between(commit.timestamp, reference);

        let estimated = self.estimator.estimate(&metadata, occurrences, months);
        let adjusted =
            self.estimator
                .adjust_for_category(estimated, metadata.has_config(), metadata.has_tests());
        let weight = self.weighter.calculate_weight(commit.timestamp, reference);
        // Blending can leave the range on either side.
        let confidence = clamp_confidence(self.weighter.adjust_confidence(adjusted, weight));

        let reasoning = format!(
            "{} (rule: {}, {} files, {} lines, seen {} times before)",
            classification.reason,
            classification.rule,
            metadata.total_files,
            metadata.total_lines_changed,
            occurrences
        );

        let event = SyntheticEvent::from_commit(
            &commit.hash,
            commit.timestamp,
            EventMetadata {
                category: classification.category,
                files: commit.files.clone(),
                lines_changed: metadata.total_lines_changed,
                author: commit.author.clone(),
                confidence,
                synthetic: true,
                commit_hash: commit.hash.clone(),
                reasoning,
            },
        );

        (counter.record(key), Some(event))
    }

    /// Partition events by UTC day, in date order.
    pub fn group_events_by_date(
        &self,
        events: &[SyntheticEvent],
    ) -> BTreeMap<String, Vec<SyntheticEvent>> {
        let mut groups: BTreeMap<String, Vec<SyntheticEvent>> = BTreeMap::new();
        for event in events {
            groups.entry(event.date_key()).or_default().push(event.clone());
        }
        groups
    }
}
