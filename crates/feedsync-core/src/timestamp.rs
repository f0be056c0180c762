//! Resolution of partial listing timestamps into absolute instants.
//!
//! # Design
//! - Listings carry two shapes: `Mon DD HH:MM` for recent entries and
//!   `Mon DD YYYY` for older ones. The first has no year; the second has
//!   no time of day.
//! - Filename-embedded digits may override individual components after the
//!   coarse resolution, because some datasets encode finer or more
//!   reliable timestamps in the name than the listing does.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use feedsync_config::{ByteRange, TimeField};

use crate::error::{SyncError, SyncResult};

/// Resolve a listing timestamp against `now`.
///
/// The `HH:MM` shape assumes the current year; minutes are retained as
/// listed and only the absent seconds are zero. When the naive resolution
/// lands strictly after `now`, the year is decremented by one — a December
/// entry listed in early January belongs to the previous year.
pub fn resolve(time_text: &str, now: NaiveDateTime) -> SyncResult<NaiveDateTime> {
    let unresolvable = |reason: &'static str| SyncError::TimestampResolution {
        input: time_text.to_string(),
        reason,
    };

    if time_text.contains(':') {
        let with_year = format!("{} {time_text}", now.year());
        let resolved = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M")
            .map_err(|_| unresolvable("bad_recent_shape"))?;
        if resolved > now {
            return resolved
                .with_year(now.year() - 1)
                .ok_or_else(|| unresolvable("rollback_invalid_date"));
        }
        Ok(resolved)
    } else {
        let date = NaiveDate::parse_from_str(time_text, "%b %d %Y")
            .map_err(|_| unresolvable("bad_dated_shape"))?;
        Ok(date.and_time(NaiveTime::MIN))
    }
}

/// Overwrite components of `timestamp` with integers sliced out of `name`.
pub fn apply_extract(
    timestamp: NaiveDateTime,
    name: &str,
    extract: &BTreeMap<TimeField, ByteRange>,
) -> SyncResult<NaiveDateTime> {
    use chrono::Timelike;

    let mut resolved = timestamp;
    for (&field, range) in extract {
        let unresolvable = |reason: &'static str| SyncError::TimestampResolution {
            input: name.to_string(),
            reason,
        };
        let digits = range.slice(name).ok_or_else(|| unresolvable("range_out_of_bounds"))?;
        let value: u32 = digits.parse().map_err(|_| unresolvable("non_numeric_field"))?;
        resolved = match field {
            TimeField::Year => resolved.with_year(i32::try_from(value).unwrap_or(i32::MAX)),
            TimeField::Month => resolved.with_month(value),
            TimeField::Day => resolved.with_day(value),
            TimeField::Hour => resolved.with_hour(value),
            TimeField::Minute => resolved.with_minute(value),
            TimeField::Second => resolved.with_second(value),
        }
        .ok_or_else(|| unresolvable("component_out_of_range"))?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    type TestResult<T> = Result<T>;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .expect("valid date")
            .and_hms_opt(h, mi, 0)
            .expect("valid time")
    }

    #[test]
    fn recent_shape_assumes_current_year_and_keeps_minutes() -> TestResult<()> {
        let now = at(2023, 6, 1, 0, 0);
        let resolved = resolve("Jan 05 10:30", now)?;
        assert_eq!(resolved, at(2023, 1, 5, 10, 30));
        Ok(())
    }

    #[test]
    fn future_instant_rolls_back_one_year() -> TestResult<()> {
        let now = at(2023, 1, 2, 0, 0);
        let resolved = resolve("Dec 28 23:15", now)?;
        assert_eq!(resolved, at(2022, 12, 28, 23, 15));
        Ok(())
    }

    #[test]
    fn instant_equal_to_now_is_not_rolled_back() -> TestResult<()> {
        let now = at(2023, 6, 1, 12, 0);
        let resolved = resolve("Jun 01 12:00", now)?;
        assert_eq!(resolved, now);
        Ok(())
    }

    #[test]
    fn dated_shape_keeps_literal_year_and_defaults_to_midnight() -> TestResult<()> {
        let now = at(2023, 6, 1, 0, 0);
        let resolved = resolve("Jan 05 2019", now)?;
        assert_eq!(resolved, at(2019, 1, 5, 0, 0));

        // No rollback applies even when the listed year is the current one.
        let resolved = resolve("Dec 31 2023", now)?;
        assert_eq!(resolved, at(2023, 12, 31, 0, 0));
        Ok(())
    }

    #[test]
    fn garbage_timestamp_is_an_error() {
        let now = at(2023, 6, 1, 0, 0);
        assert!(matches!(
            resolve("Foo 99 10:00", now),
            Err(SyncError::TimestampResolution { .. })
        ));
        assert!(matches!(
            resolve("Jan 05 19x9", now),
            Err(SyncError::TimestampResolution { .. })
        ));
    }

    #[test]
    fn extract_overrides_components_from_filename() -> TestResult<()> {
        let mut extract = BTreeMap::new();
        extract.insert(TimeField::Hour, ByteRange::new(14, 16));
        extract.insert(TimeField::Minute, ByteRange::new(16, 18));

        // radar_202301051045.h5 -> hour 10, minute 45 from the name.
        let coarse = at(2023, 1, 5, 11, 0);
        let resolved = apply_extract(coarse, "radar_20230105104", &extract);
        assert!(resolved.is_err());

        let resolved = apply_extract(coarse, "radar_202301051045.h5", &extract)?;
        assert_eq!(resolved, at(2023, 1, 5, 10, 45));
        Ok(())
    }

    #[test]
    fn extract_rejects_out_of_range_components() {
        let mut extract = BTreeMap::new();
        extract.insert(TimeField::Hour, ByteRange::new(0, 2));
        let coarse = at(2023, 1, 5, 0, 0);
        assert!(matches!(
            apply_extract(coarse, "99_file.dat", &extract),
            Err(SyncError::TimestampResolution {
                reason: "component_out_of_range",
                ..
            })
        ));
    }
}
