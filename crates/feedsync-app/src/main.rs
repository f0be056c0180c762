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

//! Binary entrypoint for the feedsync mirroring tool.

use anyhow::Result;
use feedsync_app::run_app;

/// Parses the command line and runs the configured datasets.
#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}
