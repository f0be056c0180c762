//! Listing transport over a share-mounted upstream directory.
//!
//! Upstream repositories that are exported as NFS/SMB shares are reached
//! through the same listing contract as any remote backend: the mount is
//! enumerated into `ls -l`-style lines, so the core pipeline parses one
//! format regardless of where the listing came from.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use feedsync_core::{ListingTransport, SyncError, SyncResult};

/// Entries older than this render with a year instead of a time of day,
/// matching the listing convention the parser expects.
const RECENT_WINDOW_DAYS: i64 = 180;

/// Shared transport whose working directory is explicit, mutable state —
/// exactly like a long-lived remote connection handle.
pub(crate) struct MountTransport {
    root: PathBuf,
    cwd: Mutex<PathBuf>,
}

impl MountTransport {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let cwd = Mutex::new(root.clone());
        Self { root, cwd }
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn format_line(name: &str, size: u64, modified: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let age = now - modified;
        let time = if age >= Duration::zero() && age < Duration::days(RECENT_WINDOW_DAYS) {
            modified.format("%b %d %H:%M")
        } else {
            modified.format("%b %d %Y")
        };
        format!("-rw-r--r-- 1 feed feed {size} {time} {name}\r\n")
    }
}

#[async_trait]
impl ListingTransport for MountTransport {
    async fn change_dir(&self, dir: &str) -> SyncResult<()> {
        let path = self.root.join(dir.trim_start_matches('/'));
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|err| SyncError::transport("change_dir", err))?;
        if !metadata.is_dir() {
            return Err(SyncError::transport(
                "change_dir",
                std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    path.display().to_string(),
                ),
            ));
        }
        *self
            .cwd
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = path;
        Ok(())
    }

    async fn list(&self) -> SyncResult<Bytes> {
        let dir = self.current_dir();
        let now = Utc::now();
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| SyncError::transport("list", err))?;

        let mut lines = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|err| SyncError::transport("list", err))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|err| SyncError::transport("list", err))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map_err(|err| SyncError::transport("list", err))?;
            lines.push(Self::format_line(
                &entry.file_name().to_string_lossy(),
                metadata.len(),
                DateTime::<Utc>::from(modified),
                now,
            ));
        }
        lines.sort_unstable();
        Ok(Bytes::from(lines.concat()))
    }

    async fn retrieve(&self, name: &str) -> SyncResult<Bytes> {
        let path = self.current_dir().join(name);
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|err| SyncError::transport("retrieve", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use feedsync_core::ListingParser;

    type TestResult<T> = Result<T>;

    fn instant(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .expect("valid date")
            .and_hms_opt(h, mi, 0)
            .expect("valid time")
            .and_utc()
    }

    #[test]
    fn recent_and_old_entries_render_the_two_listing_shapes() {
        let now = instant(2023, 6, 8, 0, 0);
        let recent = MountTransport::format_line("a.dat", 12, instant(2023, 6, 5, 10, 30), now);
        assert_eq!(recent, "-rw-r--r-- 1 feed feed 12 Jun 05 10:30 a.dat\r\n");

        let old = MountTransport::format_line("b.dat", 7, instant(2019, 1, 5, 10, 30), now);
        assert_eq!(old, "-rw-r--r-- 1 feed feed 7 Jan 05 2019 b.dat\r\n");
    }

    #[tokio::test]
    async fn lists_and_retrieves_through_the_listing_contract() -> TestResult<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::create_dir(dir.path().join("radar")).await?;
        tokio::fs::write(dir.path().join("radar/file_a.dat"), b"hello").await?;

        let transport = MountTransport::new(dir.path());
        transport.change_dir("/radar").await?;

        let payload = transport.list().await?;
        let parser = ListingParser::new(&payload);
        let entries: Vec<_> = parser.entries().collect::<SyncResult<_>>()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "file_a.dat");
        assert_eq!(entries[0].size, 5);

        let payload = transport.retrieve("file_a.dat").await?;
        assert_eq!(payload.as_ref(), b"hello");
        Ok(())
    }

    #[tokio::test]
    async fn change_dir_rejects_missing_directories() -> TestResult<()> {
        let dir = tempfile::tempdir()?;
        let transport = MountTransport::new(dir.path());
        assert!(transport.change_dir("/absent").await.is_err());
        Ok(())
    }
}
