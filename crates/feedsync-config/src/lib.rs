#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Typed dataset configuration for the feedsync mirroring pipeline.
//!
//! Layout: `model.rs` (configuration models and range/template primitives),
//! `loader.rs` (TOML + environment loading), `validate.rs` (load-time
//! validation helpers).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use model::{
    ApiSettings, ApiSpec, AppConfig, ArchiveSettings, ByteRange, DatasetConfig, ListingSettings,
    ListingSpec, SourceSpec, TargetSpec, TemplateItem, TimeField, TimeSpan,
};
