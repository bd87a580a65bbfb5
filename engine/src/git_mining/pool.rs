//! Bounded execution pool for git subprocesses.

use super::GitMiningError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default number of git subprocesses allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Default timeout for a single per-commit lookup.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Default timeout for the history listing.
pub const DEFAULT_LOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the execution pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of calls in flight.
    pub max_concurrent: usize,
    /// Timeout applied to each per-commit call.
    pub call_timeout: Duration,
    /// Timeout applied to the history listing.
    pub log_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            log_timeout: DEFAULT_LOG_TIMEOUT,
        }
    }
}

/// Limits how many git calls run concurrently and how long each may take.
///
/// The pool is built explicitly and shared by `Arc`, so tests can control
/// both limits.
pub struct ExecutionPool {
    semaphore: Semaphore,
    config: PoolConfig,
}

impl ExecutionPool {
    pub fn new(config: PoolConfig) -> Self {
        let permits = config.max_concurrent.max(1);
        Self {
            semaphore: Semaphore::new(permits),
            config,
        }
    }

    /// Number of calls that could start right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run a per-commit call under the pool's concurrency and call timeout.
    pub async fn run<F, T>(&self, call: F) -> Result<T, GitMiningError>
    where
        F: Future<Output = Result<T, GitMiningError>>,
    {
        self.run_with_timeout(self.config.call_timeout, call).await
    }

    /// Run the history listing under the pool's log timeout.
    pub async fn run_log<F, T>(&self, call: F) -> Result<T, GitMiningError>
    where
        F: Future<Output = Result<T, GitMiningError>>,
    {
        self.run_with_timeout(self.config.log_timeout, call).await
    }

    async fn run_with_timeout<F, T>(&self, limit: Duration, call: F) -> Result<T, GitMiningError>
    where
        F: Future<Output = Result<T, GitMiningError>>,
    {
        // The clock starts once a permit is held, not while queued.
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GitMiningError::PoolClosed)?;

        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GitMiningError::Timeout(limit)),
        }
    }
}

impl Default for ExecutionPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let pool = ExecutionPool::default();
        let value = pool.run(async { Ok::<_, GitMiningError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let pool = ExecutionPool::new(PoolConfig {
            call_timeout: Duration::from_millis(20),
            ..PoolConfig::default()
        });

        let result = pool
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, GitMiningError>(())
            })
            .await;

        assert!(matches!(result, Err(GitMiningError::Timeout(_))));
        assert_eq!(pool.available_permits(), DEFAULT_MAX_CONCURRENT);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let pool = Arc::new(ExecutionPool::new(PoolConfig {
            max_concurrent: 2,
            ..PoolConfig::default()
        }));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            tasks.spawn(async move {
                pool.run(async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, GitMiningError>(())
                })
                .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_zero_concurrency_still_admits_one() {
        let pool = ExecutionPool::new(PoolConfig {
            max_concurrent: 0,
            ..PoolConfig::default()
        });
        assert_eq!(pool.available_permits(), 1);
    }
}
