//! HTTP client for the EDSM `api-v1` endpoints.

use super::{SphereQuery, SystemsApi};
use crate::config::EdsmConfig;
use crate::error::EdsmError;
use crate::models::{Coordinates, SystemRecord};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Flags that make sphere-systems return the full record.
const SPHERE_FLAGS: [&str; 7] = [
    "showCoordinates",
    "showPermit",
    "showId",
    "showAllegiance",
    "showGovernment",
    "showInformation",
    "showPrimaryStar",
];

/// EDSM client. One per run.
pub struct EdsmClient {
    http: reqwest::Client,
    base_url: String,
}

impl EdsmClient {
    /// Create a client from the `[edsm]` settings.
    pub fn new(config: &EdsmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create EDSM HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api-v1/{}", self.base_url, path)
    }
}

impl SystemsApi for EdsmClient {
    async fn get_coords(&self, system_name: &str) -> Result<Coordinates, EdsmError> {
        let response = self
            .http
            .get(self.endpoint("system"))
            .query(&[("systemName", system_name), ("showCoordinates", "1")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("EDSM system lookup for {}: {}", system_name, status);

        if !status.is_success() {
            return Err(EdsmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_coords(system_name, &body)
    }

    async fn sphere_systems(
        &self,
        query: &SphereQuery<'_>,
    ) -> Result<Vec<SystemRecord>, EdsmError> {
        let mut params: Vec<(&str, String)> = vec![
            ("x", query.center.x.to_string()),
            ("y", query.center.y.to_string()),
            ("z", query.center.z.to_string()),
            ("radius", query.radius_ly.to_string()),
            ("limit", query.limit.to_string()),
        ];
        params.extend(SPHERE_FLAGS.iter().map(|flag| (*flag, "1".to_string())));

        let response = self
            .http
            .get(self.endpoint("sphere-systems"))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        debug!("EDSM sphere query near {}: {}", query.label, status);
        if !status.is_success() {
            warn!("EDSM returned {} for systems near {}", status, query.label);
        }

        let body = response.text().await?;
        Ok(parse_sphere_systems(query.label, &body))
    }
}

/// Extract coordinates from an `api-v1/system` body.
///
/// EDSM answers `[]` for unknown systems, so anything without a
/// well-formed `coords` object is treated as missing.
pub fn parse_coords(system_name: &str, body: &str) -> Result<Coordinates, EdsmError> {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("coords").cloned())
        .and_then(|coords| serde_json::from_value::<Coordinates>(coords).ok())
        .ok_or_else(|| EdsmError::MissingCoordinates(system_name.to_string()))
}

/// Parse an `api-v1/sphere-systems` body. Never fails.
pub fn parse_sphere_systems(label: &str, body: &str) -> Vec<SystemRecord> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse JSON for {}: {}", label, e);
            return Vec::new();
        }
    };

    let Value::Array(items) = value else {
        warn!("No systems returned for {}.", label);
        return Vec::new();
    };

    let total = items.len();
    let systems: Vec<SystemRecord> = items
        .into_iter()
        .filter_map(SystemRecord::from_value)
        .collect();

    if systems.len() < total {
        warn!(
            "Dropped {} unnamed entries from the response for {}",
            total - systems.len(),
            label
        );
    }
    if systems.is_empty() {
        warn!("No systems returned for {}.", label);
    }

    systems
}
