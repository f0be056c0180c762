#![forbid(unsafe_code)]

//! Synchronization engine mirroring rolling windows of dataset files from
//! an upstream repository into a downstream archive.
//!
//! Control flow per dataset: source adapter -> listing parser -> timestamp
//! resolver -> name translator -> retention window -> diff engine ->
//! transfer executor. Datasets run independently and sequentially; the
//! target directory's own listing is the only persisted state.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDateTime;
use feedsync_config::DatasetConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod api;
pub mod diff;
pub mod error;
pub mod listing;
pub mod retention;
pub mod source;
pub mod target;
pub mod template;
pub mod timestamp;
pub mod transfer;

pub use api::ApiSource;
pub use diff::{Diff, PlanItem, TransferPlan};
pub use error::{SyncError, SyncResult};
pub use listing::ListingParser;
pub use retention::RetentionWindow;
pub use source::{ListingSource, ListingTransport, SourceAdapter, SourceEntry};
pub use target::{LocalStore, TargetStore};
pub use transfer::{TransferExecutor, TransferStats};

/// Per-call timeout and cancellation threaded through every transport and
/// store operation. Unattended scheduled runs must not hang on a stalled
/// connection.
#[derive(Debug, Clone)]
pub struct CallLimits {
    timeout: Duration,
    cancel: CancellationToken,
}

impl CallLimits {
    /// Build limits from a timeout and a shared cancellation token.
    #[must_use]
    pub const fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Run one call under the timeout, aborting early on cancellation.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> SyncResult<T>
    where
        F: Future<Output = SyncResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        tokio::select! {
            () = self.cancel.cancelled() => Err(SyncError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(SyncError::Timeout { operation }),
            },
        }
    }
}

/// Run-wide execution options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Timeout applied to each transport or store call.
    pub timeout: Duration,
    /// Plan and log without executing transfers or deletes.
    pub dry_run: bool,
    /// Token cancelling the run between calls.
    pub cancel: CancellationToken,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }
}

/// Outcome of one dataset run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Transfers remaining after the already-present names were dropped.
    pub planned_inserts: usize,
    /// Stale target entries marked for deletion.
    pub planned_deletes: usize,
    /// What the executor actually did.
    pub stats: TransferStats,
}

/// Drives the full pipeline for one dataset at a time.
pub struct Synchronizer<'a> {
    store: &'a dyn TargetStore,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    /// Create a synchronizer over a target store.
    #[must_use]
    pub fn new(store: &'a dyn TargetStore, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Synchronize one dataset: list the upstream, build the plan from live
    /// entries, diff against the target listing, and execute the result.
    ///
    /// `now` is sampled once by the caller so every classification in the
    /// run shares a single reference instant.
    pub async fn run_dataset(
        &self,
        dataset: &DatasetConfig,
        source: &dyn SourceAdapter,
        now: NaiveDateTime,
    ) -> SyncResult<SyncOutcome> {
        let limits = CallLimits::new(self.options.timeout, self.options.cancel.clone());

        let entries = limits
            .run("list_available", source.list_available(now))
            .await?;
        let window = RetentionWindow::new(now, dataset.keep.to_duration());

        let mut plan = TransferPlan::new();
        for entry in entries {
            if let Some(substring) = dataset.source.ignore()
                && entry.name.contains(substring)
            {
                continue;
            }
            if !window.is_live(entry.timestamp) {
                continue;
            }
            let target_name =
                template::render(&entry.name, entry.timestamp, &dataset.target.template)?;
            plan.insert(
                target_name,
                PlanItem {
                    source: entry.name,
                    size: entry.size,
                },
            );
        }

        let listing = limits
            .run("list_target", self.store.list(&dataset.target.directory))
            .await?;
        let diff = diff::compute(
            plan,
            &listing,
            &window,
            dataset.target.timestamp_slice,
            &dataset.target.directory,
        )?;
        info!(
            dataset = dataset.name,
            inserts = diff.inserts.len(),
            deletes = diff.deletes.len(),
            "synchronizing"
        );

        let planned_inserts = diff.inserts.len();
        let planned_deletes = diff.deletes.len();
        let executor = TransferExecutor {
            source,
            store: self.store,
            limits: &limits,
            target_dir: &dataset.target.directory,
            allow_null: dataset.allow_null,
            dry_run: self.options.dry_run,
        };
        let stats = executor.run(diff).await?;

        Ok(SyncOutcome {
            planned_inserts,
            planned_deletes,
            stats,
        })
    }
}
