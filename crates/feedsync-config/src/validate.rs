//! Load-time validation of the application configuration.
//!
//! # Design
//! - Pure helpers returning structured errors; no IO.
//! - Everything that can be rejected before a run starts is rejected here,
//!   so the pipeline never has to guess about malformed specifications.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{AppConfig, DatasetConfig, SourceSpec, TemplateItem};

/// Width of the fixed hour-precision `%Y%m%d%H` timestamp in target names.
pub const TARGET_TIMESTAMP_WIDTH: usize = 10;

/// Validate the whole configuration.
///
/// # Errors
///
/// Returns the first inconsistency found: a dataset referencing an absent
/// backend section, a duplicate dataset name, or an invalid dataset field.
pub fn validate(config: &AppConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for dataset in &config.datasets {
        if config.archive.is_none() {
            return Err(ConfigError::MissingSection {
                dataset: dataset.name.clone(),
                section: "archive",
            });
        }
        if !seen.insert(dataset.name.as_str()) {
            return Err(ConfigError::DuplicateDataset {
                name: dataset.name.clone(),
            });
        }
        validate_dataset(dataset)?;
        match &dataset.source {
            SourceSpec::Listing(_) if config.listing.is_none() => {
                return Err(ConfigError::MissingSection {
                    dataset: dataset.name.clone(),
                    section: "listing",
                });
            }
            SourceSpec::Api(_) if config.api.is_none() => {
                return Err(ConfigError::MissingSection {
                    dataset: dataset.name.clone(),
                    section: "api",
                });
            }
            SourceSpec::Listing(_) | SourceSpec::Api(_) => {}
        }
    }
    Ok(())
}

/// Validate a single dataset specification.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the offending field.
pub fn validate_dataset(dataset: &DatasetConfig) -> ConfigResult<()> {
    let invalid = |field: &'static str, reason: &'static str| ConfigError::InvalidField {
        dataset: dataset.name.clone(),
        field,
        reason,
    };

    if dataset.name.is_empty() {
        return Err(invalid("name", "empty"));
    }
    if dataset.keep.to_duration() <= chrono::Duration::zero() {
        return Err(invalid("keep", "not_positive"));
    }
    if dataset.target.template.is_empty() {
        return Err(invalid("target.template", "empty"));
    }
    for item in &dataset.target.template {
        if let TemplateItem::Strftime(pattern) = item
            && pattern.is_empty()
        {
            return Err(invalid("target.template", "empty_pattern"));
        }
    }
    if dataset.target.timestamp_slice.len() != TARGET_TIMESTAMP_WIDTH {
        return Err(invalid("target.timestamp_slice", "width_mismatch"));
    }

    match &dataset.source {
        SourceSpec::Listing(spec) => {
            if spec.directory.is_empty() {
                return Err(invalid("source.directory", "empty"));
            }
        }
        SourceSpec::Api(spec) => {
            if spec.dataset.is_empty() {
                return Err(invalid("source.dataset", "empty"));
            }
            if spec.step.is_zero() {
                return Err(invalid("source.step", "not_positive"));
            }
            if spec.lookback == 0 {
                return Err(invalid("source.lookback", "not_positive"));
            }
            if spec.filename_format.is_empty() {
                return Err(invalid("source.filename_format", "empty"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ByteRange, ListingSpec, TargetSpec, TimeSpan};
    use std::collections::BTreeMap;

    fn listing_dataset(name: &str) -> DatasetConfig {
        DatasetConfig {
            name: name.to_string(),
            source: SourceSpec::Listing(ListingSpec {
                directory: "/pub/radar".to_string(),
                ignore: None,
                extract: BTreeMap::new(),
            }),
            target: TargetSpec {
                directory: "archive/radar".to_string(),
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

    #[test]
    fn accepts_well_formed_dataset() {
        assert!(validate_dataset(&listing_dataset("radar")).is_ok());
    }

    #[test]
    fn rejects_non_positive_keep() {
        let mut dataset = listing_dataset("radar");
        dataset.keep = TimeSpan::default();
        assert!(matches!(
            validate_dataset(&dataset),
            Err(ConfigError::InvalidField {
                field: "keep",
                reason: "not_positive",
                ..
            })
        ));
    }

    #[test]
    fn rejects_wrong_timestamp_slice_width() {
        let mut dataset = listing_dataset("radar");
        dataset.target.timestamp_slice = ByteRange::new(0, 8);
        assert!(matches!(
            validate_dataset(&dataset),
            Err(ConfigError::InvalidField {
                field: "target.timestamp_slice",
                ..
            })
        ));
    }

    fn config_with(datasets: Vec<DatasetConfig>) -> AppConfig {
        AppConfig {
            archive: Some(crate::model::ArchiveSettings {
                root: "/srv/archive".into(),
            }),
            listing: Some(crate::model::ListingSettings {
                root: "/mnt/upstream".into(),
            }),
            api: None,
            timeout_secs: 60,
            datasets,
        }
    }

    #[test]
    fn rejects_duplicate_dataset_names() {
        let config = config_with(vec![listing_dataset("radar"), listing_dataset("radar")]);
        assert!(matches!(
            validate(&config),
            Err(ConfigError::DuplicateDataset { .. })
        ));
    }

    #[test]
    fn listing_dataset_requires_listing_section() {
        let mut config = config_with(vec![listing_dataset("radar")]);
        config.listing = None;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingSection {
                section: "listing",
                ..
            })
        ));
    }

    #[test]
    fn datasets_require_an_archive_section() {
        let mut config = config_with(vec![listing_dataset("radar")]);
        config.archive = None;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingSection {
                section: "archive",
                ..
            })
        ));
    }
}
