//! JSON file storage for synthetic events and patterns
//!
//! Events live in one file per UTC day (`events/YYYY-MM-DD.json`), each a
//! JSON array. Patterns live in a single document. Both stores merge new
//! records into whatever is already on disk and never truncate it. Existing
//! records are kept as raw JSON so events written by other producers
//! survive a merge untouched.

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{MemoryError, Result};
use crate::event::SyntheticEvent;
use crate::pattern::RetroactivePattern;

/// Version written into the pattern document
pub const PATTERN_STORE_VERSION: &str = "1.0";

/// Check whether a stored event record was produced by reconstruction
pub fn is_synthetic(record: &Value) -> bool {
    record
        .pointer("/metadata/synthetic")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn synthetic_commit_hash(record: &Value) -> Option<&str> {
    if !is_synthetic(record) {
        return None;
    }
    record.pointer("/metadata/commit_hash").and_then(Value::as_str)
}

/// Write `value` next to `path` and rename it into place
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Counts over the whole event store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStoreStats {
    pub days: usize,
    pub total_events: usize,
    pub synthetic_events: usize,
    pub observed_events: usize,
    pub unreadable_days: usize,
}

/// Day-partitioned event store
pub struct EventStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl EventStore {
    /// Open the store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn day_path(&self, date_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", date_key))
    }

    /// Sorted list of day keys present on disk. An absent directory is empty.
    pub fn day_keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Load the records of one day. A missing file is an empty day.
    pub fn load_day(&self, date_key: &str) -> Result<Vec<Value>> {
        let path = self.day_path(date_key);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(records) => Ok(records),
            _ => Err(MemoryError::malformed(path, "expected a JSON array")),
        }
    }

    /// True if any day holds at least one event that was not reconstructed.
    /// Unreadable days are logged and ignored.
    pub fn has_observed_events(&self) -> Result<bool> {
        for key in self.day_keys()? {
            match self.load_day(&key) {
                Ok(records) => {
                    if records.iter().any(|r| !is_synthetic(r)) {
                        return Ok(true);
                    }
                }
                Err(e) => log::warn!("Skipping unreadable event day {}: {}", key, e),
            }
        }
        Ok(false)
    }

    /// Merge synthetic events into one day, ahead of existing records.
    ///
    /// An event whose commit hash already appears on a synthetic record of
    /// that day is skipped, so repeated runs do not stack duplicates.
    /// Returns the number of events actually written.
    pub fn merge_day(&self, date_key: &str, events: &[SyntheticEvent]) -> Result<usize> {
        let _guard = self.write_lock.lock();

        let existing = self.load_day(date_key)?;
        let known: HashSet<String> = existing
            .iter()
            .filter_map(synthetic_commit_hash)
            .map(String::from)
            .collect();

        let mut merged = Vec::with_capacity(existing.len() + events.len());
        let mut added = 0;
        for event in events {
            if known.contains(&event.metadata.commit_hash) {
                log::debug!(
                    "Event for commit {} already stored on {}",
                    event.metadata.commit_hash,
                    date_key
                );
                continue;
            }
            merged.push(serde_json::to_value(event)?);
            added += 1;
        }

        if added == 0 {
            return Ok(0);
        }

        merged.extend(existing);
        write_json_atomic(&self.day_path(date_key), &merged)?;
        log::debug!("Merged {} synthetic events into {}", added, date_key);
        Ok(added)
    }

    /// Summarize the store contents
    pub fn stats(&self) -> Result<EventStoreStats> {
        let mut stats = EventStoreStats::default();
        for key in self.day_keys()? {
            stats.days += 1;
            match self.load_day(&key) {
                Ok(records) => {
                    let synthetic = records.iter().filter(|r| is_synthetic(r)).count();
                    stats.total_events += records.len();
                    stats.synthetic_events += synthetic;
                    stats.observed_events += records.len() - synthetic;
                }
                Err(e) => {
                    log::warn!("Failed to read event day {}: {}", key, e);
                    stats.unreadable_days += 1;
                }
            }
        }
        Ok(stats)
    }
}

/// Single-document pattern store
pub struct PatternStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PatternStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(doc) => Ok(doc),
            _ => Err(MemoryError::malformed(&self.path, "expected a JSON object")),
        }
    }

    /// Load all stored patterns as raw records
    pub fn load(&self) -> Result<Vec<Value>> {
        let mut doc = self.load_document()?;
        match doc.remove("patterns") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(patterns)) => Ok(patterns),
            Some(_) => Err(MemoryError::malformed(
                &self.path,
                "`patterns` is not an array",
            )),
        }
    }

    /// Append patterns to the stored collection. Existing entries are kept.
    pub fn merge(&self, patterns: &[RetroactivePattern]) -> Result<usize> {
        let _guard = self.write_lock.lock();

        let mut doc = self.load_document()?;
        let mut stored = match doc.remove("patterns") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(existing)) => existing,
            Some(_) => {
                return Err(MemoryError::malformed(
                    &self.path,
                    "`patterns` is not an array",
                ))
            }
        };

        for pattern in patterns {
            stored.push(serde_json::to_value(pattern)?);
        }

        doc.insert("patterns".to_string(), Value::Array(stored));
        doc.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        doc.insert(
            "version".to_string(),
            Value::String(PATTERN_STORE_VERSION.to_string()),
        );
        doc.insert("synthetic".to_string(), Value::Bool(true));

        write_json_atomic(&self.path, &Value::Object(doc))?;
        log::info!(
            "Stored {} patterns at {}",
            patterns.len(),
            self.path.display()
        );
        Ok(patterns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CommitCategory, EventMetadata};
    use crate::pattern::PatternCategory;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn event(hash: &str, day: u32) -> SyntheticEvent {
        let ts = Utc.with_ymd_and_hms(2024, 5, day, 9, 30, 0).unwrap();
        SyntheticEvent::from_commit(
            hash,
            ts,
            EventMetadata {
                category: CommitCategory::Feature,
                files: vec!["src/lib.rs".to_string()],
                lines_changed: 80,
                author: "Sam".to_string(),
                confidence: 0.7,
                synthetic: true,
                commit_hash: hash.to_string(),
                reasoning: "feature keyword".to_string(),
            },
        )
    }

    fn pattern(slug: &str) -> RetroactivePattern {
        let now = Utc::now();
        RetroactivePattern {
            id: RetroactivePattern::derive_id(slug, now),
            pattern: format!("{} pattern", slug),
            frequency: 3,
            confidence: 0.75,
            first_seen: now,
            last_seen: now,
            evidence_ids: vec![],
            category: PatternCategory::Structural,
            impact: "medium".to_string(),
        }
    }

    #[test]
    fn test_absent_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path().join("events"));
        assert!(store.day_keys().unwrap().is_empty());
        assert!(!store.has_observed_events().unwrap());
        assert_eq!(store.stats().unwrap(), EventStoreStats::default());
    }

    #[test]
    fn test_merge_prepends_and_keeps_observed() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        let observed = json!([{ "id": "real-1", "type": "file_change", "metadata": {} }]);
        std::fs::write(dir.path().join("2024-05-02.json"), observed.to_string()).unwrap();

        let added = store
            .merge_day("2024-05-02", &[event("aaaaaaaaaa", 2)])
            .unwrap();
        assert_eq!(added, 1);

        let records = store.load_day("2024-05-02").unwrap();
        assert_eq!(records.len(), 2);
        assert!(is_synthetic(&records[0]));
        assert_eq!(records[1]["id"], "real-1");
        assert!(store.has_observed_events().unwrap());
    }

    #[test]
    fn test_merge_skips_known_commits() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());

        assert_eq!(store.merge_day("2024-05-03", &[event("bbbbbbbbbb", 3)]).unwrap(), 1);
        assert_eq!(store.merge_day("2024-05-03", &[event("bbbbbbbbbb", 3)]).unwrap(), 0);
        assert_eq!(store.load_day("2024-05-03").unwrap().len(), 1);
        assert!(!store.has_observed_events().unwrap());
    }

    #[test]
    fn test_stats_counts_kinds() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        std::fs::write(
            dir.path().join("2024-05-04.json"),
            json!([{ "id": "real" }]).to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("2024-05-05.json"), "{ not json").unwrap();
        store.merge_day("2024-05-04", &[event("cccccccccc", 4)]).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.days, 2);
        assert_eq!(stats.total_events, 2);
        assert_eq!(stats.synthetic_events, 1);
        assert_eq!(stats.observed_events, 1);
        assert_eq!(stats.unreadable_days, 1);
    }

    #[test]
    fn test_non_array_day_is_malformed() {
        let dir = TempDir::new().unwrap();
        let store = EventStore::new(dir.path());
        std::fs::write(dir.path().join("2024-05-06.json"), "{}").unwrap();
        assert!(matches!(
            store.load_day("2024-05-06"),
            Err(MemoryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_pattern_merge_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(
            &path,
            json!({ "patterns": [{ "id": "manual" }], "owner": "team" }).to_string(),
        )
        .unwrap();

        let store = PatternStore::new(&path);
        assert_eq!(store.merge(&[pattern("feature")]).unwrap(), 1);
        assert_eq!(store.merge(&[pattern("config")]).unwrap(), 1);

        let patterns = store.load().unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0]["id"], "manual");

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["version"], PATTERN_STORE_VERSION);
        assert_eq!(doc["synthetic"], true);
        assert_eq!(doc["owner"], "team");
        assert!(doc["generated_at"].is_string());
    }

    #[test]
    fn test_pattern_store_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = PatternStore::new(dir.path().join("nested").join("patterns.json"));
        assert!(store.load().unwrap().is_empty());
        store.merge(&[pattern("fix")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }
}
