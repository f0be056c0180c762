//! Configuration loading from a TOML file with environment overrides.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;
use crate::validate;

/// Environment prefix for overrides, e.g. `FEEDSYNC__API__KEY`.
const ENV_PREFIX: &str = "FEEDSYNC__";

/// Load and validate the application configuration.
///
/// Values from the environment take precedence over the file, which keeps
/// the API key out of world-readable configuration when desired.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when the file cannot be read or
/// deserialized, or a validation error when the resulting configuration is
/// inconsistent.
pub fn load(path: &Path) -> ConfigResult<AppConfig> {
    let config: AppConfig = Figment::new()
        .merge(Toml::file_exact(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|err| ConfigError::Load {
            source: Box::new(err),
        })?;
    validate::validate(&config)?;
    Ok(config)
}
