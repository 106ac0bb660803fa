//! Spreadsheet export.
//!
//! Pulls named ranges from a Google spreadsheet, cleans them and writes
//! one JSON array per range.

pub mod clean;
pub mod client;
pub mod exporter;

pub use client::SheetsClient;
pub use exporter::export_ranges;

use crate::error::SheetsError;
use serde_json::Value;
use std::fmt;

/// Credentials for the Sheets API.
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    /// OAuth access token, e.g. minted for a service account.
    BearerToken(String),
    /// API key; only works for publicly shared spreadsheets.
    ApiKey(String),
}

impl SheetsAuth {
    /// Pick credentials from the CLI/environment, preferring a bearer token.
    pub fn from_options(token: Option<&str>, api_key: Option<&str>) -> Option<Self> {
        non_empty(token)
            .map(|t| SheetsAuth::BearerToken(t.to_string()))
            .or_else(|| non_empty(api_key).map(|k| SheetsAuth::ApiKey(k.to_string())))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetsAuth::BearerToken(_) => write!(f, "BearerToken(<redacted>)"),
            SheetsAuth::ApiKey(_) => write!(f, "ApiKey(<redacted>)"),
        }
    }
}

/// Read access to spreadsheet ranges.
#[allow(async_fn_in_trait)]
pub trait SheetsApi {
    /// All rows of `range`, header row first, as the API returns them.
    async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<Value>>, SheetsError>;
}
