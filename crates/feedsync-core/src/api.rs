//! Source adapter over a paginated metadata API.
//!
//! # Design
//! - The upstream cannot be listed wholesale; instead the expected
//!   filenames are computed by walking backward from "now" in the
//!   dataset's publication step, then verified against the listing
//!   endpoint.
//! - The endpoint paginates with a filename cursor (`startAfterFilename`),
//!   not an offset, so the expected set is verified in two batches split
//!   around a pivot filename.
//! - An item counts as available only when the reported last-modified
//!   instant lies strictly after the item's own computed instant; a stale
//!   re-publication under the same name is ignored.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use feedsync_config::{ApiSettings, ApiSpec};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::{SyncError, SyncResult};
use crate::source::{SourceAdapter, SourceEntry};
use crate::timestamp;

#[derive(Debug, Deserialize)]
struct FileListing {
    files: Vec<FileMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMeta {
    filename: String,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadLocation {
    temporary_download_url: String,
}

/// Source adapter backed by the metadata API.
pub struct ApiSource {
    client: reqwest::Client,
    base_url: String,
    max_keys: u32,
    spec: ApiSpec,
}

impl ApiSource {
    /// Build a client carrying the static API key for one dataset.
    pub fn new(settings: &ApiSettings, spec: ApiSpec) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&settings.key).map_err(|_| SyncError::Api {
            operation: "client_build",
            detail: "api key is not a valid header value".to_string(),
        })?;
        headers.insert(AUTHORIZATION, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| SyncError::Http {
                operation: "client_build",
                source: err,
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_keys: settings.max_keys,
            spec,
        })
    }

    fn files_url(&self) -> String {
        format!(
            "{}/{}/versions/{}/files",
            self.base_url, self.spec.dataset, self.spec.version
        )
    }

    /// Render the instant `steps` publication intervals before the aligned
    /// "now" into the dataset's filename convention.
    fn instant_at(&self, now: NaiveDateTime, steps: u32) -> SyncResult<NaiveDateTime> {
        let step_secs = self.spec.step.to_duration().num_seconds();
        let now_secs = now.and_utc().timestamp();
        let aligned = now_secs - now_secs.rem_euclid(step_secs);
        let target = aligned - i64::from(steps) * step_secs;
        DateTime::<Utc>::from_timestamp(target, 0)
            .map(|instant| instant.naive_utc())
            .ok_or(SyncError::TimestampResolution {
                input: now.to_string(),
                reason: "unrepresentable_instant",
            })
    }

    /// Expected filenames, oldest first by rendered name.
    fn expected(&self, now: NaiveDateTime) -> SyncResult<Vec<(String, NaiveDateTime)>> {
        let mut expected = Vec::with_capacity(self.spec.lookback as usize);
        for steps in 0..self.spec.lookback {
            let instant = self.instant_at(now, steps)?;
            let name = instant.format(&self.spec.filename_format).to_string();
            expected.push((name, instant));
        }
        expected.sort();
        Ok(expected)
    }

    async fn collect_page(
        &self,
        available: &mut BTreeMap<String, DateTime<Utc>>,
        start_after: &str,
    ) -> SyncResult<()> {
        let response = self
            .client
            .get(self.files_url())
            .query(&[
                ("maxKeys", self.max_keys.to_string()),
                ("startAfterFilename", start_after.to_string()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SyncError::Http {
                operation: "list_files",
                source: err,
            })?;
        let listing: FileListing = response.json().await.map_err(|err| SyncError::Http {
            operation: "list_files",
            source: err,
        })?;
        for file in listing.files {
            available.insert(file.filename, file.last_modified);
        }
        Ok(())
    }
}

#[async_trait]
impl SourceAdapter for ApiSource {
    async fn list_available(&self, now: NaiveDateTime) -> SyncResult<Vec<SourceEntry>> {
        let expected = self.expected(now)?;

        // Cursor preceding the oldest expected name: one extra step back.
        let before_oldest = self
            .instant_at(now, self.spec.lookback)?
            .format(&self.spec.filename_format)
            .to_string();

        let mut available = BTreeMap::new();
        if expected.len() < 2 {
            self.collect_page(&mut available, &before_oldest).await?;
        } else {
            let pivot = expected[expected.len() / 2 - 1].0.clone();
            self.collect_page(&mut available, &before_oldest).await?;
            self.collect_page(&mut available, &pivot).await?;
        }

        let mut entries = Vec::new();
        for (name, instant) in expected {
            let Some(last_modified) = available.get(&name) else {
                continue;
            };
            if last_modified.naive_utc() <= instant {
                continue;
            }
            let resolved = timestamp::apply_extract(instant, &name, &self.spec.extract)?;
            entries.push(SourceEntry {
                name,
                timestamp: resolved,
                size: None,
            });
        }
        Ok(entries)
    }

    async fn retrieve(&self, name: &str) -> SyncResult<Bytes> {
        let url = format!("{}/{}/url", self.files_url(), name);
        let location: DownloadLocation = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SyncError::Http {
                operation: "download_url",
                source: err,
            })?
            .json()
            .await
            .map_err(|err| SyncError::Http {
                operation: "download_url",
                source: err,
            })?;

        self.client
            .get(&location.temporary_download_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| SyncError::Http {
                operation: "download",
                source: err,
            })?
            .bytes()
            .await
            .map_err(|err| SyncError::Http {
                operation: "download",
                source: err,
            })
    }
}
