//! Upstream source seam and the listing-backed adapter.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;
use feedsync_config::ListingSpec;

use crate::error::SyncResult;
use crate::listing::ListingParser;
use crate::timestamp;

/// One upstream entry with its fully resolved timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Source filename.
    pub name: String,
    /// Resolved instant, filename overrides already applied.
    pub timestamp: NaiveDateTime,
    /// Size in bytes, when the upstream reports one.
    pub size: Option<u64>,
}

/// Capability contract for upstream access.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Enumerate the entries currently offered by the upstream.
    async fn list_available(&self, now: NaiveDateTime) -> SyncResult<Vec<SourceEntry>>;
    /// Fetch the full payload for one entry.
    async fn retrieve(&self, name: &str) -> SyncResult<Bytes>;
}

/// Low-level transport operations for listing-backed upstreams. Implemented
/// outside the core by whatever networking library carries the connection.
#[async_trait]
pub trait ListingTransport: Send + Sync {
    /// Change the connection's working directory.
    async fn change_dir(&self, dir: &str) -> SyncResult<()>;
    /// Issue a listing command in the current working directory.
    async fn list(&self) -> SyncResult<Bytes>;
    /// Fetch the full payload of a file in the current working directory.
    async fn retrieve(&self, name: &str) -> SyncResult<Bytes>;
}

/// Source adapter over a line-oriented directory listing.
pub struct ListingSource {
    transport: Arc<dyn ListingTransport>,
    spec: ListingSpec,
}

impl ListingSource {
    /// Wrap a shared transport for one dataset's source directory.
    #[must_use]
    pub fn new(transport: Arc<dyn ListingTransport>, spec: ListingSpec) -> Self {
        Self { transport, spec }
    }
}

#[async_trait]
impl SourceAdapter for ListingSource {
    async fn list_available(&self, now: NaiveDateTime) -> SyncResult<Vec<SourceEntry>> {
        // The connection's working directory is shared across datasets, so
        // it is set explicitly on every run rather than inherited.
        self.transport.change_dir(&self.spec.directory).await?;
        let payload = self.transport.list().await?;

        let parser = ListingParser::new(&payload);
        let mut entries = Vec::new();
        for raw in parser.entries() {
            let raw = raw?;
            let coarse = timestamp::resolve(&raw.time_text, now)?;
            let resolved = timestamp::apply_extract(coarse, &raw.name, &self.spec.extract)?;
            entries.push(SourceEntry {
                name: raw.name,
                timestamp: resolved,
                size: Some(raw.size),
            });
        }
        Ok(entries)
    }

    async fn retrieve(&self, name: &str) -> SyncResult<Bytes> {
        self.transport.retrieve(name).await
    }
}
