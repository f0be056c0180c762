#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint wiring configuration, logging, and the dataset
//! orchestrator together.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use feedsync_core::SyncOptions;
use tokio_util::sync::CancellationToken;

mod bootstrap;
mod orchestrator;
mod transport;

/// Mirror rolling windows of upstream dataset files into an archive.
#[derive(Debug, Parser)]
#[command(name = "feedsync", version)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "feedsync.toml")]
    config: PathBuf,

    /// Synchronize only the named dataset.
    #[arg(long)]
    dataset: Option<String>,

    /// Plan and log without transferring or deleting anything.
    #[arg(long)]
    dry_run: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, env = "FEEDSYNC_LOG")]
    log_level: Option<String>,
}

/// Parse the command line, load the configuration, and run all datasets.
///
/// # Errors
///
/// Returns an error only when the run could not start or when every
/// attempted dataset failed; partial failures are reported in the logs so
/// a single flaky dataset does not page a scheduled run.
pub async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    bootstrap::init_logging(cli.log_level.as_deref())?;

    let config = feedsync_config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let options = SyncOptions {
        timeout: Duration::from_secs(config.timeout_secs),
        dry_run: cli.dry_run,
        cancel,
    };

    let summary = orchestrator::run(&config, &options, cli.dataset.as_deref()).await?;
    if let Some(name) = &cli.dataset
        && summary.attempted == 0
    {
        bail!("dataset '{name}' is not configured");
    }
    if summary.attempted > 0 && summary.failed == summary.attempted {
        bail!("all {} attempted datasets failed", summary.attempted);
    }
    Ok(())
}
