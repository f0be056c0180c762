//! Execution of the planned deletes and atomic copies.
//!
//! # Design
//! - Deletes and per-item transfer failures are logged and skipped; one bad
//!   item must not sink the rest of the dataset.
//! - A payload is only ever written to `{final}.in` and renamed into place
//!   after the write completes. The rename is the sole externally visible
//!   commit, so no observer of the target directory sees a partial file
//!   under its final name.

use tracing::{info, warn};

use crate::CallLimits;
use crate::diff::Diff;
use crate::error::{SyncError, SyncResult};
use crate::source::SourceAdapter;
use crate::target::TargetStore;

/// Suffix of the temporary path used before the atomic rename.
pub const TEMP_SUFFIX: &str = ".in";

/// Counters describing one executed dataset run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Files copied to their final name.
    pub copied: usize,
    /// Stale files removed from the target.
    pub removed: usize,
    /// Items skipped by the size or null-byte policy.
    pub skipped: usize,
    /// Items abandoned on transport or store failures.
    pub failed: usize,
}

/// Executes one dataset's diff against the source and target backends.
pub struct TransferExecutor<'a> {
    /// Upstream to fetch payloads from.
    pub source: &'a dyn SourceAdapter,
    /// Target store receiving the files.
    pub store: &'a dyn TargetStore,
    /// Timeout and cancellation applied to each call.
    pub limits: &'a CallLimits,
    /// Target directory the dataset mirrors into.
    pub target_dir: &'a str,
    /// Whether payloads containing null bytes are acceptable.
    pub allow_null: bool,
    /// Plan only; do not touch the store.
    pub dry_run: bool,
}

impl TransferExecutor<'_> {
    /// Run the deletes, then the inserts. Returns early only on
    /// cancellation; all other per-item failures are logged and counted.
    pub async fn run(&self, diff: Diff) -> SyncResult<TransferStats> {
        let mut stats = TransferStats::default();

        for path in &diff.deletes {
            if self.dry_run {
                info!(path, "would remove");
                stats.removed += 1;
                continue;
            }
            match self.limits.run("delete", self.store.delete(path)).await {
                Ok(()) => {
                    info!(path, "removed");
                    stats.removed += 1;
                }
                Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err) => {
                    warn!(path, error = %err, "remove failed; continuing");
                    stats.failed += 1;
                }
            }
        }

        for (target_name, item) in &diff.inserts {
            let final_path = format!("{}/{target_name}", self.target_dir.trim_end_matches('/'));
            if self.dry_run {
                info!(source = item.source, target = final_path, "would copy");
                stats.copied += 1;
                continue;
            }

            let payload = match self
                .limits
                .run("retrieve", self.source.retrieve(&item.source))
                .await
            {
                Ok(payload) => payload,
                Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err) => {
                    warn!(source = item.source, error = %err, "retrieve failed; continuing");
                    stats.failed += 1;
                    continue;
                }
            };

            // A length mismatch means the upstream file was truncated or
            // still being written; nothing is written in that case.
            if let Some(expected) = item.size
                && payload.len() as u64 != expected
            {
                warn!(
                    source = item.source,
                    expected,
                    actual = payload.len(),
                    "size mismatch; skipping"
                );
                stats.skipped += 1;
                continue;
            }
            if !self.allow_null && payload.contains(&0) {
                warn!(source = item.source, "null byte in payload; skipping");
                stats.skipped += 1;
                continue;
            }

            let temp_path = format!("{final_path}{TEMP_SUFFIX}");
            let written = self
                .limits
                .run("write", self.store.write(&temp_path, &payload))
                .await;
            match written {
                Ok(()) => {}
                Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err) => {
                    warn!(target = final_path, error = %err, "write failed; continuing");
                    stats.failed += 1;
                    continue;
                }
            }
            match self
                .limits
                .run("rename", self.store.rename(&temp_path, &final_path))
                .await
            {
                Ok(()) => {
                    info!(source = item.source, target = final_path, "copied");
                    stats.copied += 1;
                }
                Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                Err(err) => {
                    warn!(target = final_path, error = %err, "rename failed; continuing");
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}
