//! Retention-window arithmetic and live/stale classification.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use feedsync_config::ByteRange;

use crate::error::{SyncError, SyncResult};

/// Width of the date part of the target timestamp (`%Y%m%d`).
const DATE_WIDTH: usize = 8;

/// Classifies entries against the `now - keep` cutoff.
#[derive(Debug, Clone, Copy)]
pub struct RetentionWindow {
    threshold: NaiveDateTime,
}

impl RetentionWindow {
    /// Build the window for one run.
    #[must_use]
    pub fn new(now: NaiveDateTime, keep: Duration) -> Self {
        Self {
            threshold: now - keep,
        }
    }

    /// The cutoff instant. Comparisons are strict: an entry exactly at the
    /// threshold is retained.
    #[must_use]
    pub const fn threshold(&self) -> NaiveDateTime {
        self.threshold
    }

    /// Whether a source entry's timestamp is within the window.
    #[must_use]
    pub fn is_live(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.threshold
    }

    /// Whether an existing target entry is stale, judged by the fixed
    /// hour-precision timestamp sliced out of its bare filename.
    ///
    /// A name that fails the slice or the parse is fatal for the dataset:
    /// silently skipping it risks either keeping garbage forever or
    /// deleting something live.
    pub fn target_is_stale(&self, name: &str, slice: ByteRange) -> SyncResult<bool> {
        let parsed = parse_target_timestamp(name, slice)?;
        Ok(parsed < self.threshold)
    }
}

/// Recover the hour-precision timestamp embedded in a target filename.
pub fn parse_target_timestamp(name: &str, slice: ByteRange) -> SyncResult<NaiveDateTime> {
    let unparseable = |reason: &'static str| SyncError::TargetNameParse {
        name: name.to_string(),
        reason,
    };

    let text = slice.slice(name).ok_or_else(|| unparseable("slice_out_of_bounds"))?;
    let (date_text, hour_text) = text.split_at_checked(DATE_WIDTH).ok_or_else(|| unparseable("slice_too_short"))?;
    let date = NaiveDate::parse_from_str(date_text, "%Y%m%d")
        .map_err(|_| unparseable("bad_date"))?;
    let hour: u32 = hour_text.parse().map_err(|_| unparseable("bad_hour"))?;
    date.and_hms_opt(hour, 0, 0).ok_or_else(|| unparseable("bad_hour"))
}
