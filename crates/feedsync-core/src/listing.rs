//! Parser for `ls -l`-style directory listing payloads.
//!
//! # Design
//! - The full payload is collected first, then parsed; there is no stateful
//!   streaming accumulator.
//! - Parsing is lazy per line; re-iterating requires re-parsing.

use crate::error::{SyncError, SyncResult};

/// Column index of the size field.
const SIZE_FIELD: usize = 4;
/// Column range of the timestamp fields, joined by single spaces.
const TIME_FIELDS: std::ops::Range<usize> = 5..8;
/// Column index of the entry name.
const NAME_FIELD: usize = 8;

/// One listing line, split into the columns the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry name (column 8). Names containing spaces are not supported by
    /// the column scheme; the tail after the first name token is dropped.
    /// Known limitation of the listing format, not worked around here.
    pub name: String,
    /// Size in bytes (column 4).
    pub size: u64,
    /// Timestamp text, columns 5..8 joined by a space.
    pub time_text: String,
}

/// Parses the raw payload of a listing response.
#[derive(Debug)]
pub struct ListingParser {
    text: String,
}

impl ListingParser {
    /// Decode a listing payload. Non-ASCII bytes are replaced rather than
    /// rejected; names produced by the feeds this mirrors are plain ASCII.
    #[must_use]
    pub fn new(payload: &[u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    /// Iterate over the listing's entries. The final empty line produced by
    /// the trailing CRLF is discarded.
    pub fn entries(&self) -> impl Iterator<Item = SyncResult<RawEntry>> + '_ {
        let mut lines: Vec<&str> = self.text.split("\r\n").collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }
        lines.into_iter().map(parse_line)
    }
}

fn parse_line(line: &str) -> SyncResult<RawEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() <= NAME_FIELD {
        return Err(SyncError::ListingParse {
            line: line.to_string(),
            reason: "too_few_fields",
        });
    }
    let size = fields[SIZE_FIELD]
        .parse::<u64>()
        .map_err(|_| SyncError::ListingParse {
            line: line.to_string(),
            reason: "unparseable_size",
        })?;
    Ok(RawEntry {
        name: fields[NAME_FIELD].to_string(),
        size,
        time_text: fields[TIME_FIELDS].join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    type TestResult<T> = Result<T>;

    #[test]
    fn parses_recent_and_old_lines() -> TestResult<()> {
        let payload = b"-rw-r--r-- 1 u g 1024 Jan 05 10:00 file_20230105.dat\r\n\
                        -rw-r--r-- 1 u g 2048 Jan 05 2019 old_file.dat\r\n";
        let parser = ListingParser::new(payload);
        let entries: Vec<RawEntry> = parser.entries().collect::<SyncResult<_>>()?;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "file_20230105.dat");
        assert_eq!(entries[0].size, 1024);
        assert_eq!(entries[0].time_text, "Jan 05 10:00");
        assert_eq!(entries[1].name, "old_file.dat");
        assert_eq!(entries[1].size, 2048);
        assert_eq!(entries[1].time_text, "Jan 05 2019");
        Ok(())
    }

    #[test]
    fn discards_trailing_empty_line_only() -> TestResult<()> {
        let payload = b"-rw-r--r-- 1 u g 10 Feb 01 00:30 a.dat\r\n";
        let parser = ListingParser::new(payload);
        assert_eq!(parser.entries().count(), 1);

        let empty = ListingParser::new(b"");
        assert_eq!(empty.entries().count(), 0);
        Ok(())
    }

    #[test]
    fn short_line_is_a_parse_error() {
        let parser = ListingParser::new(b"drwxr-xr-x 2 u g 4096\r\n");
        let results: Vec<_> = parser.entries().collect();
        assert!(matches!(
            results[0],
            Err(SyncError::ListingParse {
                reason: "too_few_fields",
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_size_is_a_parse_error() {
        let parser = ListingParser::new(b"-rw-r--r-- 1 u g big Jan 05 10:00 a.dat\r\n");
        let results: Vec<_> = parser.entries().collect();
        assert!(matches!(
            results[0],
            Err(SyncError::ListingParse {
                reason: "unparseable_size",
                ..
            })
        ));
    }
}
