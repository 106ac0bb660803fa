//! Error types for the external seams.
//!
//! Fatal input problems, per-anchor EDSM failures and per-range spreadsheet
//! failures each get their own enum so callers can decide which ones abort
//! the run and which ones are logged and skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Problems with the anchor systems file. These abort the run.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Required file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No anchor systems found in {}", .0.display())]
    Empty(PathBuf),

    #[error("Missing required column '{column}' in {}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Invalid anchor on line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Failed to read anchor file: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures talking to EDSM. Logged per anchor, never fatal.
#[derive(Debug, Error)]
pub enum EdsmError {
    #[error("EDSM error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("No coordinates found for system '{0}'")]
    MissingCoordinates(String),

    #[error("EDSM request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures fetching or exporting one spreadsheet range.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Sheets API error for range '{range}': {status} - {body}")]
    Status {
        range: String,
        status: u16,
        body: String,
    },

    #[error("Range '{0}' has no header row")]
    MissingHeader(String),

    #[error("Malformed Sheets response for range '{range}': {source}")]
    Decode {
        range: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Sheets request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_messages() {
        let err = InputError::NotFound(PathBuf::from("data/vis_anchor_systems.csv"));
        assert_eq!(
            err.to_string(),
            "Required file not found: data/vis_anchor_systems.csv"
        );

        let err = InputError::MissingColumn {
            path: PathBuf::from("a.csv"),
            column: "radius_ly",
        };
        assert!(err.to_string().contains("radius_ly"));
    }

    #[test]
    fn test_edsm_error_messages() {
        let err = EdsmError::Status {
            status: 429,
            body: "Too Many Requests".to_string(),
        };
        assert_eq!(err.to_string(), "EDSM error: 429 - Too Many Requests");

        let err = EdsmError::MissingCoordinates("Sol".to_string());
        assert_eq!(err.to_string(), "No coordinates found for system 'Sol'");
    }
}
