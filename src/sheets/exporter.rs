//! Per-range export loop.

use super::clean::{clean_column_name, rows_to_records};
use super::SheetsApi;
use crate::error::SheetsError;
use crate::report;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One successfully written range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExport {
    pub range: String,
    pub path: PathBuf,
    pub records: usize,
}

/// Result of exporting every configured range.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub exported: Vec<RangeExport>,
    /// Range name and error message for each range that failed.
    pub failed: Vec<(String, String)>,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// File name used for a range's JSON output.
pub fn output_file_name(range: &str, index: usize) -> String {
    let stem = clean_column_name(range);
    if stem.is_empty() {
        format!("range_{}.json", index + 1)
    } else {
        format!("{}.json", stem)
    }
}

/// Export each range to `output_dir`. A failing range is reported and
/// the remaining ranges are still exported.
pub async fn export_ranges<S: SheetsApi>(
    api: &S,
    ranges: &[String],
    output_dir: &Path,
) -> ExportSummary {
    let mut summary = ExportSummary::default();

    for (index, range) in ranges.iter().enumerate() {
        let path = output_dir.join(output_file_name(range, index));

        match export_range(api, range, &path).await {
            Ok(records) => {
                info!("Exported {} records from '{}' to {}", records, range, path.display());
                summary.exported.push(RangeExport {
                    range: range.clone(),
                    path,
                    records,
                });
            }
            Err(e) => {
                error!("Failed to export range '{}': {}", range, e);
                summary.failed.push((range.clone(), e.to_string()));
            }
        }
    }

    summary
}

async fn export_range<S: SheetsApi>(api: &S, range: &str, path: &Path) -> Result<usize, SheetsError> {
    let rows = api.fetch_values(range).await?;
    let records = rows_to_records(range, rows)?;
    report::write_json(&records, path)?;
    Ok(records.len())
}
