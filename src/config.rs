//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.oasis.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".oasis.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// EDSM API settings.
    #[serde(default)]
    pub edsm: EdsmConfig,

    /// Combined dataset freshness settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Spreadsheet export settings.
    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// Paths and output names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the anchors file and all outputs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Anchors CSV, relative to `data_dir` unless absolute.
    #[serde(default = "default_anchors_file")]
    pub anchors_file: PathBuf,

    /// Base name of the combined dataset (`.json` and `.csv` are appended).
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Also write the combined dataset as CSV.
    #[serde(default = "default_true")]
    pub write_csv: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            anchors_file: default_anchors_file(),
            output_name: default_output_name(),
            write_csv: true,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_anchors_file() -> PathBuf {
    PathBuf::from("vis_anchor_systems.csv")
}

fn default_output_name() -> String {
    "combined_visualization_systems".to_string()
}

fn default_true() -> bool {
    true
}

/// EDSM API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdsmConfig {
    /// EDSM base URL.
    #[serde(default = "default_edsm_url")]
    pub base_url: String,

    /// Maximum systems requested per sphere query.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for EdsmConfig {
    fn default() -> Self {
        Self {
            base_url: default_edsm_url(),
            limit: default_limit(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_edsm_url() -> String {
    "https://www.edsm.net".to_string()
}

fn default_limit() -> u32 {
    10_000
}

fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("oasis-datagen/{}", env!("CARGO_PKG_VERSION"))
}

/// Freshness gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Reuse the combined dataset if it is younger than this.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
        }
    }
}

fn default_max_age_hours() -> u64 {
    24
}

/// Google Sheets export settings.
///
/// Credentials are never read from the file; they come from the
/// environment through the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Sheets API base URL.
    #[serde(default = "default_sheets_url")]
    pub base_url: String,

    /// Spreadsheet identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    /// Named ranges (usually worksheet titles) to export.
    #[serde(default = "default_ranges")]
    pub ranges: Vec<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_sheets_url(),
            spreadsheet_id: None,
            ranges: default_ranges(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_sheets_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_ranges() -> Vec<String> {
    vec!["Systems", "Stations", "Factions"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.clone();
        }
        if let Some(ref anchors) = args.anchors {
            self.general.anchors_file = anchors.clone();
        }
        if let Some(ref name) = args.output_name {
            self.general.output_name = name.clone();
        }
        if args.no_csv {
            self.general.write_csv = false;
        }

        if let Some(ref url) = args.edsm_url {
            self.edsm.base_url = url.clone();
        }
        if let Some(limit) = args.limit {
            self.edsm.limit = limit;
        }
        if let Some(timeout) = args.timeout {
            self.edsm.timeout_seconds = timeout;
            self.sheets.timeout_seconds = timeout;
        }

        if let Some(hours) = args.max_age_hours {
            self.cache.max_age_hours = hours;
        }

        if let Some(ref id) = args.spreadsheet_id {
            self.sheets.spreadsheet_id = Some(id.clone());
        }
        if let Some(ref ranges) = args.ranges {
            self.sheets.ranges = ranges.clone();
        }
    }

    /// Resolved path of the anchors CSV.
    pub fn anchors_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.general.anchors_file)
    }

    /// Resolved path of the combined JSON document.
    pub fn combined_json_path(&self) -> PathBuf {
        self.general
            .data_dir
            .join(format!("{}.json", self.general.output_name))
    }

    /// Resolved path of the combined CSV export.
    pub fn combined_csv_path(&self) -> PathBuf {
        self.general
            .data_dir
            .join(format!("{}.csv", self.general.output_name))
    }

    /// Maximum age of a reusable combined dataset.
    ///
    /// Hours beyond what `chrono::Duration` can hold saturate, so the cache
    /// never expires rather than wrapping negative.
    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.cache.max_age_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
