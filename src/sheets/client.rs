//! Google Sheets v4 `values.get` client.

use super::{SheetsApi, SheetsAuth};
use crate::config::SheetsConfig;
use crate::error::SheetsError;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Body of a `values.get` response. `values` is omitted for empty ranges.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Read-only client for one spreadsheet.
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig, spreadsheet_id: String, auth: SheetsAuth) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create Sheets HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid Sheets base URL: {}", config.base_url))?;

        Ok(Self {
            http,
            base_url,
            spreadsheet_id,
            auth,
        })
    }

    /// URL of the `values.get` endpoint for `range`, with the range escaped.
    fn values_url(&self, range: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Sheets base URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }
}

impl SheetsApi for SheetsClient {
    async fn fetch_values(&self, range: &str) -> Result<Vec<Vec<Value>>, SheetsError> {
        let url = self.values_url(range)?;

        let mut request = self
            .http
            .get(url)
            .query(&[("majorDimension", "ROWS"), ("valueRenderOption", "FORMATTED_VALUE")]);
        request = match &self.auth {
            SheetsAuth::BearerToken(token) => request.bearer_auth(token),
            SheetsAuth::ApiKey(key) => request.query(&[("key", key)]),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Sheets range {}: {}", range, status);

        if !status.is_success() {
            return Err(SheetsError::Status {
                range: range.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        parse_value_range(range, &body)
    }
}

/// Decode a `values.get` body into rows.
pub fn parse_value_range(range: &str, body: &str) -> Result<Vec<Vec<Value>>, SheetsError> {
    serde_json::from_str::<ValueRange>(body)
        .map(|vr| vr.values)
        .map_err(|source| SheetsError::Decode {
            range: range.to_string(),
            source,
        })
}
