//! End-to-end reconstruction driver.

use crate::classifier::{CommitClassifier, FilePatterns};
use crate::config::{ConfigError, ReconstructionConfig};
use crate::error::RetroResult;
use crate::git_mining::{CommitHistoryScanner, CommitSource, ExecutionPool, ScanOptions};
use crate::inference::PatternInferencer;
use crate::synthesizer::EventSynthesizer;
use retrograph_memory::{
    EventStore, PatternStore, RetroactivePattern, SyntheticEvent, TemporalWeighter,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under the workspace holding reconstructed state.
pub const DATA_DIR: &str = ".retrograph";

/// Outcome of one reconstruction run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionSummary {
    pub commits_analyzed: usize,
    pub events_generated: usize,
    /// Events written to the store; lower than generated when some were
    /// already present or a day failed to write.
    pub events_persisted: usize,
    pub patterns_detected: usize,
    pub average_confidence: f32,
    /// Labels of the patterns detected in this run.
    pub patterns: Vec<String>,
    /// Non-fatal degradations in any stage.
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Decides whether to reconstruct and drives the pipeline.
pub struct ReconstructionOrchestrator<S: CommitSource> {
    scanner: CommitHistoryScanner<S>,
    synthesizer: EventSynthesizer,
    inferencer: PatternInferencer,
    events: EventStore,
    patterns: PatternStore,
}

impl<S: CommitSource> ReconstructionOrchestrator<S> {
    /// Create an orchestrator persisting into `data_dir`.
    pub fn new(source: S, pool: Arc<ExecutionPool>, data_dir: &Path) -> RetroResult<Self> {
        let scanner = CommitHistoryScanner::new(Arc::new(source), pool, FilePatterns::new()?);
        let synthesizer =
            EventSynthesizer::new(CommitClassifier::new()?, TemporalWeighter::default());

        Ok(Self {
            scanner,
            synthesizer,
            inferencer: PatternInferencer::new(),
            events: EventStore::new(data_dir.join("events")),
            patterns: PatternStore::new(data_dir.join("patterns.json")),
        })
    }

    /// Create an orchestrator persisting under `<workspace>/.retrograph`.
    pub fn for_workspace(
        source: S,
        pool: Arc<ExecutionPool>,
        workspace: &Path,
    ) -> RetroResult<Self> {
        Self::new(source, pool, &Self::data_dir(workspace))
    }

    pub fn data_dir(workspace: &Path) -> PathBuf {
        workspace.join(DATA_DIR)
    }

    pub fn event_store(&self) -> &EventStore {
        &self.events
    }

    pub fn pattern_store(&self) -> &PatternStore {
        &self.patterns
    }

    /// False once any stored day holds an observed (non-synthetic) event.
    /// An empty, absent or unreadable store allows reconstruction.
    pub fn should_reconstruct(&self) -> bool {
        match self.events.has_observed_events() {
            Ok(has_observed) => !has_observed,
            Err(e) => {
                tracing::warn!("Could not inspect event store: {}", e);
                true
            }
        }
    }

    /// Run scan, synthesis, inference and persistence.
    ///
    /// Only an invalid configuration is an error. Every other failure is
    /// recorded as a warning and the run reports whatever was produced.
    pub async fn reconstruct(
        &self,
        config: &ReconstructionConfig,
    ) -> Result<ReconstructionSummary, ConfigError> {
        config.validate()?;

        tracing::info!(
            "Starting reconstruction (max {} commits)",
            config.max_commits
        );

        let scan = self.scanner.scan(&ScanOptions::from(config)).await;
        let mut warnings = scan.warnings;

        let events = self.synthesizer.synthesize_events(&scan.commits);
        let patterns = self.inferencer.infer_patterns(&events);

        let events_persisted = self.persist_events(&events, &mut warnings);
        self.persist_patterns(&patterns, &mut warnings);

        let average_confidence = average_confidence(&events);
        let summary = format!(
            "Reconstructed {} events and {} patterns from {} commits (average confidence {:.2})",
            events.len(),
            patterns.len(),
            scan.commits.len(),
            average_confidence
        );
        if warnings.is_empty() {
            tracing::info!("{}", summary);
        } else {
            tracing::warn!("{} with {} warnings", summary, warnings.len());
        }

        Ok(ReconstructionSummary {
            commits_analyzed: scan.commits.len(),
            events_generated: events.len(),
            events_persisted,
            patterns_detected: patterns.len(),
            average_confidence,
            patterns: patterns.iter().map(|p| p.pattern.clone()).collect(),
            warnings,
            summary,
        })
    }

    fn persist_events(&self, events: &[SyntheticEvent], warnings: &mut Vec<String>) -> usize {
        let mut persisted = 0;
        for (day, day_events) in self.synthesizer.group_events_by_date(events) {
            match self.events.merge_day(&day, &day_events) {
                Ok(added) => persisted += added,
                Err(e) => {
                    tracing::warn!("Failed to store events for {}: {}", day, e);
                    warnings.push(format!("Events for {} were not stored: {}", day, e));
                }
            }
        }
        persisted
    }

    fn persist_patterns(&self, patterns: &[RetroactivePattern], warnings: &mut Vec<String>) {
        if patterns.is_empty() {
            return;
        }
        if let Err(e) = self.patterns.merge(patterns) {
            tracing::warn!("Failed to store patterns: {}", e);
            warnings.push(format!("Patterns were not stored: {}", e));
        }
    }
}

/// Mean confidence across events, zero when there are none.
fn average_confidence(events: &[SyntheticEvent]) -> f32 {
    if events.is_empty() {
        return 0.0;
    }
    events.iter().map(|e| e.confidence()).sum::<f32>() / events.len() as f32
}
