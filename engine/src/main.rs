//! Retrograph CLI Entry Point
//!
//! Reconstructs history for a workspace and prints a JSON summary on
//! stdout. Logs go to stderr.

use clap::Parser;
use retrograph::git_mining::{ExecutionPool, GitExecutor, PoolConfig};
use retrograph::{ReconstructionConfig, ReconstructionOrchestrator};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "retrograph")]
#[command(about = "Reconstruct development history from git commits")]
#[command(version)]
struct Args {
    /// Workspace directory (defaults to the current directory)
    #[arg(long, short)]
    workspace: Option<PathBuf>,

    /// JSON file with reconstruction settings
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the maximum number of commits to read
    #[arg(long)]
    max_commits: Option<usize>,

    /// Override the minimum changed lines for a commit to be kept
    #[arg(long)]
    min_lines_changed: Option<usize>,

    /// Include merge commits
    #[arg(long)]
    include_merges: bool,

    /// Reconstruct even if observed events already exist
    #[arg(long)]
    force: bool,

    /// Only report whether reconstruction would run
    #[arg(long)]
    check: bool,
}

impl Args {
    fn reconstruction_config(&self) -> Result<ReconstructionConfig, retrograph::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ReconstructionConfig::load(path)?,
            None => ReconstructionConfig::default(),
        };
        if let Some(max_commits) = self.max_commits {
            config.max_commits = max_commits;
        }
        if let Some(min_lines) = self.min_lines_changed {
            config.min_lines_changed = min_lines;
        }
        if self.include_merges {
            config.skip_merges = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            tracing::error!("Failed to serialize output: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrograph=info,retrograph_memory=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match args.reconstruction_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let workspace = match args.workspace.clone() {
        Some(workspace) => workspace,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to get current directory: {}", e);
                std::process::exit(1);
            }
        },
    };
    tracing::info!("Workspace: {:?}", workspace);

    let executor = GitExecutor::new(&workspace).unwrap_or_else(|e| {
        tracing::warn!("Git history unavailable: {}", e);
        GitExecutor::unchecked(&workspace)
    });
    let pool = Arc::new(ExecutionPool::new(PoolConfig::default()));

    let orchestrator = match ReconstructionOrchestrator::for_workspace(executor, pool, &workspace)
    {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    let should_reconstruct = orchestrator.should_reconstruct();

    if args.check {
        let stats = orchestrator.event_store().stats().ok();
        print_json(&json!({
            "shouldReconstruct": should_reconstruct,
            "stats": stats,
        }));
        return;
    }

    if !should_reconstruct && !args.force {
        tracing::info!("Observed events exist; skipping reconstruction");
        print_json(&json!({
            "skipped": true,
            "reason": "observed events already recorded",
        }));
        return;
    }

    match orchestrator.reconstruct(&config).await {
        Ok(summary) => print_json(&summary),
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    }
}
