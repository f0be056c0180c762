//! Configuration models for mirrored datasets.
//!
//! # Design
//! - Pure data carriers deserialized once from the TOML configuration file.
//! - Byte ranges and template items are explicit types resolved at load
//!   time, so render paths never re-interpret raw strings.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Duration;
use serde::de::{Deserializer, Error as DeError};
use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ByteRange {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl ByteRange {
    /// Construct a range; callers must uphold `start <= end`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of bytes covered by the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the range out of `text`, or `None` when out of bounds or not
    /// on a character boundary.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl<'de> Deserialize<'de> for ByteRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let [start, end] = <[usize; 2]>::deserialize(deserializer)?;
        if start > end {
            return Err(D::Error::custom("byte range start exceeds end"));
        }
        Ok(Self { start, end })
    }
}

/// Timestamp component that a filename byte range may override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeField {
    /// Calendar year.
    Year,
    /// Calendar month.
    Month,
    /// Day of month.
    Day,
    /// Hour of day.
    Hour,
    /// Minute of hour.
    Minute,
    /// Second of minute.
    Second,
}

/// One component of a target-name template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateItem {
    /// Copy a byte range of the source filename verbatim.
    Literal(ByteRange),
    /// Render the resolved timestamp with a chrono format pattern.
    Strftime(String),
}

/// Human-friendly duration assembled from calendar components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSpan {
    /// Whole days.
    #[serde(default)]
    pub days: i64,
    /// Whole hours.
    #[serde(default)]
    pub hours: i64,
    /// Whole minutes.
    #[serde(default)]
    pub minutes: i64,
}

impl TimeSpan {
    /// Convert to a chrono duration.
    #[must_use]
    pub fn to_duration(self) -> Duration {
        Duration::days(self.days) + Duration::hours(self.hours) + Duration::minutes(self.minutes)
    }

    /// Whether the span covers no time at all.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.to_duration() == Duration::zero()
    }
}

/// Upstream access specification for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSpec {
    /// Line-oriented directory-listing upstream.
    Listing(ListingSpec),
    /// Paginated metadata-API upstream.
    Api(ApiSpec),
}

impl SourceSpec {
    /// Substring that excludes matching source names, if configured.
    #[must_use]
    pub fn ignore(&self) -> Option<&str> {
        match self {
            Self::Listing(spec) => spec.ignore.as_deref(),
            Self::Api(spec) => spec.ignore.as_deref(),
        }
    }

    /// Filename byte ranges that override resolved timestamp components.
    #[must_use]
    pub const fn extract(&self) -> &BTreeMap<TimeField, ByteRange> {
        match self {
            Self::Listing(spec) => &spec.extract,
            Self::Api(spec) => &spec.extract,
        }
    }
}

/// Listing-backed source: a directory enumerated with an `ls -l`-style
/// listing command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Directory to change into before listing.
    pub directory: String,
    /// Skip source names containing this substring.
    #[serde(default)]
    pub ignore: Option<String>,
    /// Timestamp components read from the filename itself.
    #[serde(default)]
    pub extract: BTreeMap<TimeField, ByteRange>,
}

/// Metadata-API-backed source: expected filenames are computed by walking
/// backward from "now" and verified against a paginated listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Dataset name in the API path.
    pub dataset: String,
    /// Dataset version in the API path.
    pub version: String,
    /// Publication interval between consecutive files.
    pub step: TimeSpan,
    /// How many expected files to walk back over.
    pub lookback: u32,
    /// chrono format pattern rendering an instant into the dataset's
    /// filename convention.
    pub filename_format: String,
    /// Skip source names containing this substring.
    #[serde(default)]
    pub ignore: Option<String>,
    /// Timestamp components read from the filename itself.
    #[serde(default)]
    pub extract: BTreeMap<TimeField, ByteRange>,
}

/// Target archive specification for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Directory in the target store that holds the mirrored files.
    pub directory: String,
    /// Ordered recipe rendering a source entry into its target filename.
    pub template: Vec<TemplateItem>,
    /// Byte range of the fixed-width `%Y%m%d%H` timestamp in target names.
    pub timestamp_slice: ByteRange,
}

/// One mirrored dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Unique dataset identifier used in logs and CLI selection.
    pub name: String,
    /// Upstream access specification.
    pub source: SourceSpec,
    /// Target archive specification.
    pub target: TargetSpec,
    /// Retention window; entries older than `now - keep` are pruned.
    pub keep: TimeSpan,
    /// Accept payloads containing null bytes (default true).
    #[serde(default = "default_allow_null")]
    pub allow_null: bool,
}

const fn default_allow_null() -> bool {
    true
}

/// Connection settings for listing-backed sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSettings {
    /// Root under which listing directories are mounted.
    pub root: PathBuf,
}

/// Settings for the downstream archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Root under which dataset target directories are resolved.
    pub root: PathBuf,
}

/// Connection settings for the metadata API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL up to and including the datasets segment.
    pub base_url: String,
    /// Static API key carried in the `Authorization` header.
    pub key: String,
    /// Page size requested from the listing endpoint.
    #[serde(default = "default_max_keys")]
    pub max_keys: u32,
}

const fn default_max_keys() -> u32 {
    100
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Archive settings; required iff any dataset is configured.
    #[serde(default)]
    pub archive: Option<ArchiveSettings>,
    /// Listing backend settings; required iff a listing dataset exists.
    #[serde(default)]
    pub listing: Option<ListingSettings>,
    /// Metadata-API settings; required iff an API dataset exists.
    #[serde(default)]
    pub api: Option<ApiSettings>,
    /// Per-call timeout applied to every transport operation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Datasets to mirror, in run order.
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

const fn default_timeout_secs() -> u64 {
    60
}
