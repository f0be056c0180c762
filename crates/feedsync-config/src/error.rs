//! Error types for configuration loading and validation.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or deserialized.
    #[error("failed to load configuration")]
    Load {
        /// Underlying figment error.
        source: Box<figment::Error>,
    },
    /// A dataset field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Dataset the field belongs to.
        dataset: String,
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A dataset references a backend section that is not configured.
    #[error("missing configuration section")]
    MissingSection {
        /// Dataset requiring the section.
        dataset: String,
        /// Name of the missing section.
        section: &'static str,
    },
    /// Two datasets share the same name.
    #[error("duplicate dataset name")]
    DuplicateDataset {
        /// The repeated dataset name.
        name: String,
    },
}
