//! Commit history scanning.

use super::{
    executor::CommitSource,
    parser::{self, Commit, DiffStat},
    pool::ExecutionPool,
};
use crate::classifier::FilePatterns;
use crate::config::ReconstructionConfig;
use retrograph_memory::short_hash;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Options for a single scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_commits: usize,
    pub skip_merges: bool,
    pub min_lines_changed: usize,
}

impl From<&ReconstructionConfig> for ScanOptions {
    fn from(config: &ReconstructionConfig) -> Self {
        Self {
            max_commits: config.max_commits,
            skip_merges: config.skip_merges,
            min_lines_changed: config.min_lines_changed,
        }
    }
}

/// Result of a scan.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Commits, most recent first.
    pub commits: Vec<Commit>,
    /// Number of commits whose stat lookup failed or timed out.
    pub failed_lookups: usize,
    /// Number of commits dropped for changing too few lines.
    pub below_min_lines: usize,
    /// Non-fatal problems encountered.
    pub warnings: Vec<String>,
}

/// Retrieves a bounded, ordered list of commits with file and line data.
pub struct CommitHistoryScanner<S: CommitSource> {
    source: Arc<S>,
    pool: Arc<ExecutionPool>,
    patterns: FilePatterns,
}

impl<S: CommitSource> CommitHistoryScanner<S> {
    pub fn new(source: Arc<S>, pool: Arc<ExecutionPool>, patterns: FilePatterns) -> Self {
        Self {
            source,
            pool,
            patterns,
        }
    }

    /// Scan history. Never fails: a failed listing yields no commits and a
    /// failed per-commit lookup yields a commit with no files or lines.
    pub async fn scan(&self, options: &ScanOptions) -> ScanResult {
        let mut result = ScanResult::default();

        let listing = self
            .pool
            .run_log(self.source.log(options.max_commits, options.skip_merges))
            .await;
        let output = match listing {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to read commit history: {}", e);
                result
                    .warnings
                    .push(format!("Commit history unavailable: {}", e));
                return result;
            }
        };

        let mut commits = parser::parse_log_output(&output);
        commits.truncate(options.max_commits);
        tracing::info!("Found {} commits in history", commits.len());

        let stats = self.resolve_stats(&commits).await;

        for (commit, stat) in commits.into_iter().zip(stats) {
            match stat {
                Some(stat) => {
                    let commit = commit.with_stat(stat);
                    if commit.lines_changed() < options.min_lines_changed
                        && !self.patterns.any_config(&commit.files)
                    {
                        tracing::debug!(
                            "Dropping {}: {} lines changed",
                            short_hash(&commit.hash),
                            commit.lines_changed()
                        );
                        result.below_min_lines += 1;
                        continue;
                    }
                    result.commits.push(commit);
                }
                None => {
                    result.failed_lookups += 1;
                    result.commits.push(commit);
                }
            }
        }

        if result.failed_lookups > 0 {
            result.warnings.push(format!(
                "{} commit stat lookups failed; those commits have no file data",
                result.failed_lookups
            ));
        }

        result
    }

    /// Look up diff stats for every commit under the pool's limits.
    /// Output order matches input order; failures are `None`.
    async fn resolve_stats(&self, commits: &[Commit]) -> Vec<Option<DiffStat>> {
        let mut stats: Vec<Option<DiffStat>> = vec![None; commits.len()];
        let mut tasks = JoinSet::new();

        for (idx, commit) in commits.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let pool = Arc::clone(&self.pool);
            let hash = commit.hash.clone();
            tasks.spawn(async move {
                let output = pool.run(source.show_stat(&hash)).await;
                (idx, hash, output)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, _, Ok(output))) => stats[idx] = Some(parser::parse_stat_output(&output)),
                Ok((_, hash, Err(e))) => {
                    tracing::warn!("Stat lookup failed for {}: {}", short_hash(&hash), e);
                }
                Err(e) => tracing::warn!("Stat lookup task failed: {}", e),
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_mining::{GitMiningError, PoolConfig};
    use std::collections::HashMap;
    use std::future::Future;
    use std::time::Duration;

    /// In-memory history keyed by commit hash.
    #[derive(Default)]
    struct FakeHistory {
        log: Option<String>,
        stats: HashMap<String, String>,
        slow: Vec<String>,
    }

    impl CommitSource for FakeHistory {
        fn log(
            &self,
            _max_commits: usize,
            _skip_merges: bool,
        ) -> impl Future<Output = Result<String, GitMiningError>> + Send {
            let log = self.log.clone();
            async move { log.ok_or_else(|| GitMiningError::CommandFailed("no repo".into())) }
        }

        fn show_stat(
            &self,
            commit_hash: &str,
        ) -> impl Future<Output = Result<String, GitMiningError>> + Send {
            let stat = self.stats.get(commit_hash).cloned();
            let slow = self.slow.iter().any(|h| h == commit_hash);
            async move {
                if slow {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                stat.ok_or_else(|| GitMiningError::CommandFailed("bad object".into()))
            }
        }
    }

    fn scanner(history: FakeHistory) -> CommitHistoryScanner<FakeHistory> {
        let pool = ExecutionPool::new(PoolConfig {
            call_timeout: Duration::from_millis(50),
            ..PoolConfig::default()
        });
        CommitHistoryScanner::new(
            Arc::new(history),
            Arc::new(pool),
            FilePatterns::new().unwrap(),
        )
    }

    fn options(max_commits: usize) -> ScanOptions {
        ScanOptions {
            max_commits,
            skip_merges: true,
            min_lines_changed: 5,
        }
    }

    fn history() -> FakeHistory {
        let log = "\
aaaaaaa1|Ana|2024-05-03T10:00:00Z|feat: add auth
aaaaaaa2|Ana|2024-05-02T10:00:00Z|chore: bump deps
broken line
aaaaaaa3|Ben|2024-05-01T10:00:00Z|style: whitespace
aaaaaaa4|Ben|2024-04-30T10:00:00Z|fix: flaky thing
";
        let mut stats = HashMap::new();
        stats.insert(
            "aaaaaaa1".to_string(),
            " src/auth.rs | 300 ++++++++++\n src/lib.rs | 10 -\n".to_string(),
        );
        stats.insert(
            "aaaaaaa2".to_string(),
            " package.json | 2 +-\n".to_string(),
        );
        stats.insert("aaaaaaa3".to_string(), " src/lib.rs | 2 +-\n".to_string());
        FakeHistory {
            log: Some(log.to_string()),
            stats,
            slow: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_scan_resolves_stats_in_order() {
        let result = scanner(history()).scan(&options(10)).await;

        let hashes: Vec<&str> = result.commits.iter().map(|c| c.hash.as_str()).collect();
        // aaaaaaa3 is below the line minimum; aaaaaaa4 has no stats.
        assert_eq!(hashes, vec!["aaaaaaa1", "aaaaaaa2", "aaaaaaa4"]);

        let auth = &result.commits[0];
        assert_eq!(auth.files, vec!["src/auth.rs", "src/lib.rs"]);
        assert_eq!(auth.insertions, 300);
        assert_eq!(auth.deletions, 10);

        let bump = &result.commits[1];
        assert_eq!(bump.lines_changed(), 2);

        let missing = &result.commits[2];
        assert!(missing.files.is_empty());
        assert_eq!(missing.lines_changed(), 0);

        assert_eq!(result.failed_lookups, 1);
        assert_eq!(result.below_min_lines, 1);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_respects_max_commits() {
        let result = scanner(history()).scan(&options(1)).await;
        assert_eq!(result.commits.len(), 1);
        assert_eq!(result.commits[0].hash, "aaaaaaa1");
    }

    #[tokio::test]
    async fn test_unavailable_history_is_empty() {
        let result = scanner(FakeHistory::default()).scan(&options(10)).await;
        assert!(result.commits.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_lookup_degrades() {
        let mut slow_history = history();
        slow_history.slow.push("aaaaaaa1".to_string());

        let result = scanner(slow_history).scan(&options(10)).await;
        let auth = result
            .commits
            .iter()
            .find(|c| c.hash == "aaaaaaa1")
            .unwrap();
        assert!(auth.files.is_empty());
        assert_eq!(result.failed_lookups, 2);
    }
}
