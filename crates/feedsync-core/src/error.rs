//! Error taxonomy for the synchronization pipeline.
//!
//! # Design
//! - Structured, constant-message errors with context fields; sources are
//!   preserved rather than interpolated into messages.
//! - Per-item conditions that only skip one transfer (size mismatch, null
//!   bytes) are not errors here: they are logged by the executor and the
//!   loop continues.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors produced by the synchronization pipeline. All variants abort the
/// current dataset's run; the orchestrator continues with the next dataset.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A listing line did not match the expected column scheme.
    #[error("malformed listing line")]
    ListingParse {
        /// The offending line.
        line: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A listing timestamp or filename-embedded field could not be resolved.
    #[error("unresolvable timestamp")]
    TimestampResolution {
        /// Timestamp text or filename that failed to resolve.
        input: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A template item could not be rendered against a source name.
    #[error("template rendering failed")]
    Template {
        /// Source name the template was rendered against.
        name: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// An existing target filename did not carry a parseable timestamp.
    /// Fatal for the dataset: deletion decisions must never be guessed.
    #[error("unparseable target filename")]
    TargetNameParse {
        /// The offending target name.
        name: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A transport-level operation failed.
    #[error("transport failure")]
    Transport {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying transport error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// An HTTP request to the metadata API failed.
    #[error("metadata api failure")]
    Http {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying HTTP error.
        source: reqwest::Error,
    },
    /// The metadata API returned an unusable response.
    #[error("unexpected metadata api response")]
    Api {
        /// Operation that failed.
        operation: &'static str,
        /// Description of the unexpected response.
        detail: String,
    },
    /// A target-store operation failed.
    #[error("target store failure")]
    Store {
        /// Operation that failed.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An operation exceeded the configured per-call timeout.
    #[error("operation timed out")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
    },
    /// The run was cancelled before the operation started.
    #[error("run cancelled")]
    Cancelled,
}

impl SyncError {
    /// Build a transport error from any boxed source.
    pub fn transport<E>(operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            operation,
            source: Box::new(source),
        }
    }
}
