//! JSON and CSV output.
//!
//! Every file is written to a temporary sibling first and then renamed
//! into place, so a crashed run never leaves a truncated dataset behind
//! for the freshness gate to trip over.

use crate::models::{CombinedDataset, SystemRecord};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const ANCHOR_COLUMNS: [&str; 2] = ["anchor_system", "anchor_description"];

/// Atomically replace `path` with `content`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let mut file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    file.write_all(content)?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Write any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut content = serde_json::to_vec_pretty(value)?;
    content.push(b'\n');
    write_atomic(path, &content)
}

/// Write the combined dataset document.
pub fn write_dataset_json(dataset: &CombinedDataset, path: &Path) -> Result<()> {
    write_json(dataset, path)
}

/// Write the combined dataset as a flat CSV table.
pub fn write_dataset_csv(dataset: &CombinedDataset, path: &Path) -> Result<()> {
    let content = render_dataset_csv(&dataset.systems)?;
    write_atomic(path, &content)
}

/// Render systems as CSV.
///
/// Columns are `name`, then every flattened attribute in first-seen
/// order, then the anchor columns. Nested objects become dotted columns
/// (`coords.x`); arrays are kept as JSON text.
pub fn render_dataset_csv(systems: &[SystemRecord]) -> Result<Vec<u8>> {
    let rows: Vec<Vec<(String, String)>> = systems
        .iter()
        .map(|system| {
            let mut cells = Vec::new();
            for (key, value) in &system.attributes {
                flatten_value(key, value, &mut cells);
            }
            cells
        })
        .collect();

    let mut columns: Vec<String> = vec!["name".to_string()];
    let mut seen: HashSet<String> = columns.iter().cloned().collect();
    seen.extend(ANCHOR_COLUMNS.iter().map(|c| c.to_string()));
    for cells in &rows {
        for (key, _) in cells {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }
    columns.extend(ANCHOR_COLUMNS.iter().map(|c| c.to_string()));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;

    for (system, cells) in systems.iter().zip(&rows) {
        let record: Vec<&str> = columns
            .iter()
            .map(|column| match column.as_str() {
                "name" => system.name.as_str(),
                "anchor_system" => system.anchor_system.as_deref().unwrap_or(""),
                "anchor_description" => system.anchor_description.as_deref().unwrap_or(""),
                other => cells
                    .iter()
                    .find(|(key, _)| key == other)
                    .map(|(_, value)| value.as_str())
                    .unwrap_or(""),
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e.error()))
}

fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_value(&format!("{}.{}", prefix, key), nested, out);
            }
        }
        Value::Object(_) | Value::Null => out.push((prefix.to_string(), String::new())),
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
            out.push((prefix.to_string(), value.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value, anchor: &str) -> SystemRecord {
        let mut record = SystemRecord::from_value(value).unwrap();
        record.anchor_system = Some(anchor.to_string());
        record.anchor_description = Some(format!("{anchor} region"));
        record
    }

    fn sample_dataset() -> CombinedDataset {
        CombinedDataset::new(
            vec![
                record(
                    json!({"name": "Sol", "id": 27, "coords": {"x": 0, "y": 0, "z": 0}, "requirePermit": true}),
                    "Sol",
                ),
                record(
                    json!({"name": "Maia", "id": 5, "information": {"population": 1000, "faction": "Pleiades, Inc"}}),
                    "Pleiades",
                ),
            ],
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_render_dataset_csv() {
        let csv = String::from_utf8(render_dataset_csv(&sample_dataset().systems).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "name,id,coords.x,coords.y,coords.z,requirePermit,information.population,information.faction,anchor_system,anchor_description"
        );
        assert_eq!(lines[1], "Sol,27,0,0,0,true,,,Sol,Sol region");
        assert_eq!(
            lines[2],
            "Maia,5,,,,,1000,\"Pleiades, Inc\",Pleiades,Pleiades region"
        );
    }

    #[test]
    fn test_write_dataset_json_round_trips_through_freshness_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("combined.json");
        let dataset = sample_dataset();

        write_dataset_json(&dataset, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"last_updated\": \"2025-06-01T12:00:00+00:00\""));
        let parsed: CombinedDataset = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, dataset);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "old").unwrap();

        write_json(&json!([1, 2]), &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\n  1,\n  2\n]\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_dataset_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combined.csv");

        write_dataset_csv(&sample_dataset(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 2);
    }
}
