//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the config file.

use clap::Parser;
use std::path::PathBuf;

/// oasis-datagen - OASIS star system dataset generator
///
/// Exports the OASIS spreadsheet ranges to JSON and builds the combined
/// dataset of systems around each anchor system using EDSM.
///
/// Examples:
///   oasis-datagen
///   oasis-datagen --data-dir ./data --force
///   oasis-datagen --skip-sheets --max-age-hours 6
///   oasis-datagen --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory holding the anchors file and all outputs
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Anchors CSV (columns: name, radius_ly, description)
    ///
    /// Relative paths are resolved against --data-dir.
    #[arg(short, long, value_name = "FILE")]
    pub anchors: Option<PathBuf>,

    /// Base name of the combined dataset files
    #[arg(short, long, value_name = "NAME")]
    pub output_name: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .oasis.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reuse the combined dataset if it is younger than this many hours
    #[arg(long, value_name = "HOURS")]
    pub max_age_hours: Option<u64>,

    /// Refetch from EDSM even if the combined dataset is fresh
    #[arg(short, long)]
    pub force: bool,

    /// Skip the spreadsheet export step
    #[arg(long)]
    pub skip_sheets: bool,

    /// Skip the nearby-systems aggregation step
    #[arg(long)]
    pub skip_systems: bool,

    /// Do not write the combined CSV next to the JSON
    #[arg(long)]
    pub no_csv: bool,

    /// Spreadsheet identifier
    #[arg(long, value_name = "ID", env = "OASIS_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// OAuth bearer token for the Sheets API
    ///
    /// A service-account token, e.g. from `gcloud auth print-access-token`.
    #[arg(long, value_name = "TOKEN", env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub google_token: Option<String>,

    /// API key for publicly shared spreadsheets
    #[arg(long, value_name = "KEY", env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Spreadsheet ranges to export (comma-separated)
    ///
    /// Example: --ranges Systems,Stations
    #[arg(long, value_name = "RANGES", value_delimiter = ',')]
    pub ranges: Option<Vec<String>>,

    /// EDSM base URL
    #[arg(long, value_name = "URL", env = "EDSM_URL")]
    pub edsm_url: Option<String>,

    /// Maximum systems requested per anchor
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .oasis.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.skip_sheets && self.skip_systems {
            return Err("Nothing to do: both --skip-sheets and --skip-systems given".to_string());
        }

        if let Some(ref url) = self.edsm_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("EDSM URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.limit == Some(0) {
            return Err("Limit must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref name) = self.output_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err("Output name must be a plain file name".to_string());
            }
        }

        if let Some(ref ranges) = self.ranges {
            if ranges.iter().all(|r| r.trim().is_empty()) {
                return Err("At least one non-empty range is required".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
