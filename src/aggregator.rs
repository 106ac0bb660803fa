//! Nearby-systems aggregation.
//!
//! For each anchor in input order: resolve its coordinates, fetch every
//! system within its radius. The batches are then merged with
//! [`merge_anchor_batches`]. A failed anchor is logged and skipped. The whole step is skipped when the
//! previous dataset is still fresh.

use crate::analysis::{
    check_freshness, merge_anchor_batches, Freshness, MergeOutcome, StaleReason,
};
use crate::edsm::{SphereQuery, SystemsApi};
use crate::error::EdsmError;
use crate::models::{AnchorSystem, CombinedDataset, SystemRecord};
use crate::report;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Where and how the combined dataset is produced.
#[derive(Debug, Clone)]
pub struct AggregationOptions {
    pub json_path: PathBuf,
    /// `None` disables the CSV export.
    pub csv_path: Option<PathBuf>,
    pub limit: u32,
    pub max_age: Duration,
    /// Ignore the freshness gate.
    pub force: bool,
}

/// An anchor that contributed nothing because a lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorFailure {
    pub anchor: String,
    pub message: String,
}

/// Outcome of one fetch-and-merge pass.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub merged: MergeOutcome,
    pub failures: Vec<AnchorFailure>,
}

/// What the aggregation step did.
#[derive(Debug)]
pub enum Aggregation {
    /// The dataset on disk was fresh and left untouched.
    Reused(CombinedDataset),
    /// A new dataset was fetched and written.
    Rebuilt {
        dataset: CombinedDataset,
        report: BuildReport,
        reason: Option<StaleReason>,
    },
    /// Nothing was fetched successfully, so nothing was written.
    Empty { report: BuildReport },
}

/// Fetch every anchor's neighbourhood and merge the results.
pub async fn build_dataset<A: SystemsApi>(
    api: &A,
    anchors: &[AnchorSystem],
    limit: u32,
    progress: &ProgressBar,
) -> BuildReport {
    let mut batches = Vec::with_capacity(anchors.len());
    let mut failures = Vec::new();

    progress.set_length(anchors.len() as u64);

    for anchor in anchors {
        progress.set_message(anchor.name.clone());

        match fetch_anchor(api, anchor, limit).await {
            Ok(systems) if systems.is_empty() => {
                warn!("No systems returned for {}", anchor.name);
            }
            Ok(systems) => {
                info!(
                    "Found {} systems within {}ly of {}",
                    systems.len(),
                    anchor.radius_ly,
                    anchor.name
                );
                batches.push((anchor, systems));
            }
            Err(e) => {
                error!("Error processing {}: {}", anchor.name, e);
                failures.push(AnchorFailure {
                    anchor: anchor.name.clone(),
                    message: e.to_string(),
                });
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();

    BuildReport {
        merged: merge_anchor_batches(batches),
        failures,
    }
}

async fn fetch_anchor<A: SystemsApi>(
    api: &A,
    anchor: &AnchorSystem,
    limit: u32,
) -> Result<Vec<SystemRecord>, EdsmError> {
    let center = api.get_coords(&anchor.name).await?;
    info!("Got coordinates for {}: {}", anchor.name, center);

    let query = SphereQuery {
        label: &anchor.name,
        center,
        radius_ly: anchor.radius_ly,
        limit,
    };
    api.sphere_systems(&query).await
}

/// Run the aggregation step with the freshness gate in front of it.
pub async fn aggregate<A: SystemsApi>(
    api: &A,
    anchors: &[AnchorSystem],
    options: &AggregationOptions,
    now: DateTime<Utc>,
    progress: &ProgressBar,
) -> Result<Aggregation> {
    let reason = if options.force {
        info!("Refresh forced, skipping freshness check");
        None
    } else {
        match check_freshness(&options.json_path, options.max_age, now) {
            Freshness::Fresh(dataset) => {
                info!(
                    "Reusing {} (last updated {})",
                    options.json_path.display(),
                    dataset.last_updated
                );
                return Ok(Aggregation::Reused(dataset));
            }
            Freshness::Stale(reason) => {
                info!("Refreshing dataset: {}", reason);
                Some(reason)
            }
        }
    };

    let build = build_dataset(api, anchors, options.limit, progress).await;

    if build.merged.systems.is_empty() {
        warn!("No systems fetched for any anchor; keeping previous output");
        return Ok(Aggregation::Empty { report: build });
    }

    let dataset = CombinedDataset::new(build.merged.systems.clone(), now);
    // The JSON is what the freshness gate reads, so it goes last.
    if let Some(ref csv_path) = options.csv_path {
        report::write_dataset_csv(&dataset, csv_path)?;
    }
    report::write_dataset_json(&dataset, &options.json_path)?;

    Ok(Aggregation::Rebuilt {
        dataset,
        report: build,
        reason,
    })
}
