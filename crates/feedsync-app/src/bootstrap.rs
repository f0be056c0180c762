//! Process-wide logging installation.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor `--log-level` is provided.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configure and install the global tracing subscriber: pretty output for
/// debug builds, JSON for release builds. `RUST_LOG` wins over the CLI
/// level when set.
pub(crate) fn init_logging(level: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let installed = if cfg!(debug_assertions) {
        builder.pretty().try_init()
    } else {
        builder.json().try_init()
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
