//! Anchor systems file loading.
//!
//! The anchors file is a CSV with the columns `name`, `radius_ly` and
//! `description`. Any problem with it is fatal for the run.

use crate::error::InputError;
use crate::models::AnchorSystem;
use csv::{ReaderBuilder, Trim};
use std::path::Path;
use tracing::debug;

/// Columns the anchors file must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "radius_ly", "description"];

/// Load anchor systems in file order.
pub fn load_anchors(path: &Path) -> Result<Vec<AnchorSystem>, InputError> {
    if !path.is_file() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(InputError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut anchors = Vec::new();
    for result in reader.deserialize::<AnchorSystem>() {
        let anchor = result?;
        // Header occupies line 1.
        let line = anchors.len() as u64 + 2;
        validate_anchor(&anchor, line)?;
        debug!("Loaded anchor {} ({}ly)", anchor.name, anchor.radius_ly);
        anchors.push(anchor);
    }

    if anchors.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }

    Ok(anchors)
}

fn validate_anchor(anchor: &AnchorSystem, line: u64) -> Result<(), InputError> {
    if anchor.name.is_empty() {
        return Err(InputError::InvalidRow {
            line,
            reason: "empty system name".to_string(),
        });
    }

    if !anchor.radius_ly.is_finite() || anchor.radius_ly <= 0.0 {
        return Err(InputError::InvalidRow {
            line,
            reason: format!(
                "radius for '{}' must be a positive number, got {}",
                anchor.name, anchor.radius_ly
            ),
        });
    }

    Ok(())
}
