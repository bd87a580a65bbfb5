//! Git history access for retroactive reconstruction.
//!
//! This module provides functionality to:
//! - Run git subprocesses under a bounded, timed execution pool
//! - Parse `git log` listings and per-commit `--stat` output
//! - Scan a bounded, most-recent-first list of commits with file and line data

mod error;
mod executor;
mod parser;
mod pool;
mod scanner;

pub use error::GitMiningError;
pub use executor::{CommitSource, GitExecutor};
pub use parser::{parse_log_output, parse_stat_output, Commit, DiffStat, LOG_FORMAT};
pub use pool::{ExecutionPool, PoolConfig};
pub use scanner::{CommitHistoryScanner, ScanOptions, ScanResult};
