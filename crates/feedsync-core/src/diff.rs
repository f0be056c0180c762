//! Minimal insert/delete computation against the target directory.
//!
//! # Design
//! - The target directory's own listing is the sole source of truth for
//!   "already synced"; no state is persisted between runs.
//! - Some backends list bare filenames, others full paths; both are
//!   normalized to a bare name before comparison.

use std::collections::BTreeMap;

use feedsync_config::ByteRange;

use crate::error::SyncResult;
use crate::retention::RetentionWindow;

/// One planned transfer, keyed by rendered target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    /// Source name to fetch.
    pub source: String,
    /// Expected payload size, when the upstream listing reported one.
    pub size: Option<u64>,
}

/// Desired target names mapped to their transfer items. Keys are unique by
/// construction: entries rendering the same name overwrite earlier ones,
/// so template collisions silently deduplicate.
pub type TransferPlan = BTreeMap<String, PlanItem>;

/// Outcome of the diff: what to insert and what to delete.
#[derive(Debug, Default)]
pub struct Diff {
    /// Remaining transfers, keyed by target name.
    pub inserts: TransferPlan,
    /// Full paths of stale target entries to remove.
    pub deletes: Vec<String>,
}

/// Reduce a backend listing entry to its bare filename.
#[must_use]
pub fn bare_name(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

/// Compare the desired plan against the actual target listing.
///
/// Target entries already named in the plan are dropped from it (no
/// re-transfer) and are never deleted, even when their parsed timestamp is
/// stale: within one run, insert takes precedence over prune. Entries
/// neither planned nor stale are left untouched.
pub fn compute(
    mut plan: TransferPlan,
    target_listing: &[String],
    window: &RetentionWindow,
    timestamp_slice: ByteRange,
    target_dir: &str,
) -> SyncResult<Diff> {
    let dir = target_dir.trim_end_matches('/');
    let mut deletes = Vec::new();
    for entry in target_listing {
        let bare = bare_name(entry);
        if plan.remove(bare).is_some() {
            continue;
        }
        if window.target_is_stale(bare, timestamp_slice)? {
            deletes.push(format!("{dir}/{bare}"));
        }
    }
    Ok(Diff {
        inserts: plan,
        deletes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::{Duration, NaiveDate};

    type TestResult<T> = Result<T>;

    fn window() -> RetentionWindow {
        let now = NaiveDate::from_ymd_opt(2023, 6, 8)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time");
        RetentionWindow::new(now, Duration::days(7))
    }

    fn plan(names: &[&str]) -> TransferPlan {
        names
            .iter()
            .map(|name| {
                (
                    (*name).to_string(),
                    PlanItem {
                        source: format!("src_{name}"),
                        size: Some(1),
                    },
                )
            })
            .collect()
    }

    const SLICE: ByteRange = ByteRange::new(0, 10);

    #[test]
    fn already_present_entries_are_not_retransferred() -> TestResult<()> {
        let listing = vec!["2023060100.dat".to_string()];
        let diff = compute(
            plan(&["2023060100.dat", "2023060700.dat"]),
            &listing,
            &window(),
            SLICE,
            "archive",
        )?;
        assert_eq!(diff.inserts.len(), 1);
        assert!(diff.inserts.contains_key("2023060700.dat"));
        assert!(diff.deletes.is_empty());
        Ok(())
    }

    #[test]
    fn full_and_bare_listings_normalize_identically() -> TestResult<()> {
        for listing in [
            vec!["archive/2023060100.dat".to_string()],
            vec!["2023060100.dat".to_string()],
        ] {
            let diff = compute(
                plan(&["2023060100.dat"]),
                &listing,
                &window(),
                SLICE,
                "archive",
            )?;
            assert!(diff.inserts.is_empty());
            assert!(diff.deletes.is_empty());
        }
        Ok(())
    }

    #[test]
    fn stale_unplanned_entries_are_deleted_with_full_paths() -> TestResult<()> {
        let listing = vec![
            "2023053100.dat".to_string(),
            "2023060500.dat".to_string(),
        ];
        let diff = compute(plan(&[]), &listing, &window(), SLICE, "archive/")?;
        assert_eq!(diff.deletes, vec!["archive/2023053100.dat".to_string()]);
        Ok(())
    }

    #[test]
    fn planned_entries_survive_even_when_stale() -> TestResult<()> {
        // Present at target, named in the plan, and older than the window:
        // insert precedence means it is neither re-transferred nor deleted.
        let listing = vec!["2023053100.dat".to_string()];
        let diff = compute(plan(&["2023053100.dat"]), &listing, &window(), SLICE, "a")?;
        assert!(diff.inserts.is_empty());
        assert!(diff.deletes.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_target_name_aborts_the_diff() {
        let listing = vec!["not-a-timestamp".to_string()];
        let result = compute(plan(&[]), &listing, &window(), SLICE, "a");
        assert!(result.is_err());
    }
}
