//! Sequential dataset runner with per-dataset failure isolation.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use feedsync_config::{AppConfig, SourceSpec};
use feedsync_core::{
    ApiSource, ListingSource, ListingTransport, LocalStore, SyncError, SyncOptions, Synchronizer,
};
use tracing::{error, info, warn};

use crate::transport::MountTransport;

/// Counts of dataset runs attempted and failed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) attempted: usize,
    pub(crate) failed: usize,
}

/// Run every configured dataset in order. An error in one dataset is
/// logged and does not prevent the remaining datasets from being
/// attempted; only cancellation stops the loop.
pub(crate) async fn run(
    config: &AppConfig,
    options: &SyncOptions,
    only: Option<&str>,
) -> Result<RunSummary> {
    let archive = config
        .archive
        .as_ref()
        .context("archive section missing from configuration")?;
    let store = LocalStore::new(&archive.root);
    let synchronizer = Synchronizer::new(&store, options.clone());

    let mount: Option<Arc<dyn ListingTransport>> = config
        .listing
        .as_ref()
        .map(|settings| Arc::new(MountTransport::new(&settings.root)) as Arc<dyn ListingTransport>);

    let mut summary = RunSummary::default();
    for dataset in &config.datasets {
        if let Some(name) = only
            && dataset.name != name
        {
            continue;
        }
        if options.cancel.is_cancelled() {
            warn!("run cancelled; remaining datasets skipped");
            break;
        }
        summary.attempted += 1;

        // Sampled per dataset so a long transfer in one dataset does not
        // shift the retention threshold of the next.
        let now = Utc::now().naive_utc();
        let result = match &dataset.source {
            SourceSpec::Listing(spec) => {
                let transport = mount
                    .clone()
                    .context("listing section missing from configuration")?;
                let source = ListingSource::new(transport, spec.clone());
                synchronizer.run_dataset(dataset, &source, now).await
            }
            SourceSpec::Api(spec) => {
                let settings = config
                    .api
                    .as_ref()
                    .context("api section missing from configuration")?;
                match ApiSource::new(settings, spec.clone()) {
                    Ok(source) => synchronizer.run_dataset(dataset, &source, now).await,
                    Err(err) => Err(err),
                }
            }
        };

        match result {
            Ok(outcome) => {
                info!(
                    dataset = dataset.name,
                    copied = outcome.stats.copied,
                    removed = outcome.stats.removed,
                    skipped = outcome.stats.skipped,
                    failed = outcome.stats.failed,
                    "dataset synchronized"
                );
            }
            Err(SyncError::Cancelled) => {
                warn!(dataset = dataset.name, "dataset run cancelled");
                summary.failed += 1;
                break;
            }
            Err(err) => {
                error!(
                    dataset = dataset.name,
                    error = %err,
                    "dataset failed; continuing with the next one"
                );
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use feedsync_config::{
        ArchiveSettings, ByteRange, DatasetConfig, ListingSettings, ListingSpec, TargetSpec,
        TemplateItem, TimeSpan,
    };
    use feedsync_core::TargetStore;
    use std::collections::BTreeMap;
    use std::path::Path;

    type TestResult<T> = Result<T>;

    fn dataset(name: &str, directory: &str, target_dir: &str) -> DatasetConfig {
        DatasetConfig {
            name: name.to_string(),
            source: SourceSpec::Listing(ListingSpec {
                directory: directory.to_string(),
                ignore: None,
                extract: BTreeMap::new(),
            }),
            target: TargetSpec {
                directory: target_dir.to_string(),
                template: vec![TemplateItem::Strftime("%Y%m%d%H".to_string())],
                timestamp_slice: ByteRange::new(0, 10),
            },
            keep: TimeSpan {
                days: 7,
                ..TimeSpan::default()
            },
            allow_null: true,
        }
    }

    fn config(mount_root: &Path, archive_root: &Path) -> AppConfig {
        AppConfig {
            archive: Some(ArchiveSettings {
                root: archive_root.to_path_buf(),
            }),
            listing: Some(ListingSettings {
                root: mount_root.to_path_buf(),
            }),
            api: None,
            timeout_secs: 10,
            datasets: vec![
                dataset("broken", "broken", "broken"),
                dataset("healthy", "healthy", "healthy"),
            ],
        }
    }

    #[tokio::test]
    async fn one_failing_dataset_does_not_stop_the_next() -> TestResult<()> {
        let mount = tempfile::tempdir()?;
        let archive = tempfile::tempdir()?;

        tokio::fs::create_dir(mount.path().join("broken")).await?;
        tokio::fs::write(mount.path().join("broken/a.dat"), b"x").await?;
        tokio::fs::create_dir(mount.path().join("healthy")).await?;
        tokio::fs::write(mount.path().join("healthy/b.dat"), b"y").await?;

        // A target name that defeats the timestamp slice is fatal for the
        // first dataset only.
        tokio::fs::create_dir_all(archive.path().join("broken")).await?;
        tokio::fs::write(archive.path().join("broken/garbage-name"), b"?").await?;

        let config = config(mount.path(), archive.path());
        let summary = run(&config, &SyncOptions::default(), None).await?;

        assert_eq!(
            summary,
            RunSummary {
                attempted: 2,
                failed: 1
            }
        );
        let store = LocalStore::new(archive.path());
        assert_eq!(store.list("healthy").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn dataset_filter_selects_a_single_run() -> TestResult<()> {
        let mount = tempfile::tempdir()?;
        let archive = tempfile::tempdir()?;
        tokio::fs::create_dir(mount.path().join("broken")).await?;
        tokio::fs::create_dir(mount.path().join("healthy")).await?;

        let config = config(mount.path(), archive.path());
        let summary = run(&config, &SyncOptions::default(), Some("healthy")).await?;
        assert_eq!(
            summary,
            RunSummary {
                attempted: 1,
                failed: 0
            }
        );

        let summary = run(&config, &SyncOptions::default(), Some("absent")).await?;
        assert_eq!(summary.attempted, 0);
        Ok(())
    }
}
