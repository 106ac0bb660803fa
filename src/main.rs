//! oasis-datagen - OASIS star system dataset generator
//!
//! A batch tool that exports the OASIS spreadsheet ranges to JSON and
//! builds the combined dataset of systems around each anchor system
//! using EDSM.
//!
//! Exit codes:
//!   0 - Success (individual ranges or anchors may still have been skipped)
//!   1 - Fatal error (missing or invalid anchors file, config, output I/O)

mod aggregator;
mod analysis;
mod anchors;
mod cli;
mod config;
mod edsm;
mod error;
mod models;
mod report;
mod sheets;

use aggregator::{Aggregation, AggregationOptions, BuildReport};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use edsm::EdsmClient;
use error::InputError;
use indicatif::{ProgressBar, ProgressStyle};
use sheets::{SheetsAuth, SheetsClient};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("oasis-datagen v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        if let Some(InputError::NotFound(_) | InputError::MissingColumn { .. }) =
            e.downcast_ref::<InputError>()
        {
            eprintln!("\nPlease ensure the anchors file exists with columns:");
            eprintln!("- name: Name of the anchor system");
            eprintln!("- radius_ly: Radius in light years to search around the system");
            eprintln!("- description: Description of the anchor system");
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .oasis.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  .oasis.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .oasis.toml")?;

    println!("✅ Created .oasis.toml with default settings.");
    println!("   Edit it to set the spreadsheet, ranges, paths and cache age.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` wins over the verbosity flags.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run both steps in order.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    std::fs::create_dir_all(&config.general.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.general.data_dir.display()
        )
    })?;

    if args.skip_sheets {
        debug!("Spreadsheet export skipped");
    } else {
        export_spreadsheet(&args, &config).await;
    }

    if args.skip_systems {
        debug!("Nearby-systems aggregation skipped");
    } else {
        aggregate_systems(&args, &config).await?;
    }

    println!(
        "\n✅ Done in {:.1}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Step 1: spreadsheet export. Never fatal.
async fn export_spreadsheet(args: &Args, config: &Config) {
    println!("📄 Exporting spreadsheet ranges...");

    let Some(spreadsheet_id) = config.sheets.spreadsheet_id.clone() else {
        warn!("No spreadsheet configured (set OASIS_SPREADSHEET_ID); skipping export");
        return;
    };

    let Some(auth) =
        SheetsAuth::from_options(args.google_token.as_deref(), args.google_api_key.as_deref())
    else {
        warn!("No Sheets credentials (set GOOGLE_ACCESS_TOKEN or GOOGLE_API_KEY); skipping export");
        return;
    };

    let client = match SheetsClient::new(&config.sheets, spreadsheet_id, auth) {
        Ok(client) => client,
        Err(e) => {
            error!("Cannot create Sheets client: {:#}", e);
            return;
        }
    };

    let summary =
        sheets::export_ranges(&client, &config.sheets.ranges, &config.general.data_dir).await;

    for export in &summary.exported {
        println!(
            "   ✓ {} → {} ({} records)",
            export.range,
            export.path.display(),
            export.records
        );
    }
    for (range, message) in &summary.failed {
        println!("   ❌ {}: {}", range, message);
    }
    if !summary.is_complete() {
        warn!(
            "{} of {} ranges failed to export",
            summary.failed.len(),
            config.sheets.ranges.len()
        );
    }
}

/// Step 2: nearby-systems aggregation. Fails only on fatal input or output errors.
async fn aggregate_systems(args: &Args, config: &Config) -> Result<()> {
    let anchors_path = config.anchors_path();
    let anchors = anchors::load_anchors(&anchors_path)?;

    println!("\n🔭 Found {} anchor systems:", anchors.len());
    for anchor in &anchors {
        println!("   - {} (radius: {}ly)", anchor.name, anchor.radius_ly);
    }

    let client = EdsmClient::new(&config.edsm)?;
    let options = AggregationOptions {
        json_path: config.combined_json_path(),
        csv_path: config
            .general
            .write_csv
            .then(|| config.combined_csv_path()),
        limit: config.edsm.limit,
        max_age: config.max_age(),
        force: args.force,
    };

    println!("\n🛰️  Generating combined dataset...");
    let progress = anchor_progress_bar(args.quiet);
    let outcome =
        aggregator::aggregate(&client, &anchors, &options, Utc::now(), &progress).await?;

    match outcome {
        Aggregation::Reused(dataset) => {
            println!(
                "   ✓ {} is fresh (updated {}), reusing {} systems",
                options.json_path.display(),
                dataset.last_updated.format("%Y-%m-%d %H:%M UTC"),
                dataset.systems.len()
            );
        }
        Aggregation::Rebuilt {
            dataset, report, ..
        } => {
            print_build_report(&report);
            println!(
                "\n💾 Saved {} systems to: {}",
                dataset.systems.len(),
                options.json_path.display()
            );
            if let Some(ref csv_path) = options.csv_path {
                println!("   CSV: {}", csv_path.display());
            }
        }
        Aggregation::Empty { report } => {
            print_build_report(&report);
            println!("\n⚠️  No systems were fetched; existing output left unchanged.");
        }
    }

    Ok(())
}

fn anchor_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn print_build_report(report: &BuildReport) {
    let merged = &report.merged;

    println!("\n📊 Combining datasets...");
    println!("   Total systems before deduplication: {}", merged.total_before_dedup);

    if !merged.overlaps.is_empty() {
        println!(
            "\n   Found {} systems that appear in multiple anchor regions:",
            merged.overlaps.len()
        );
        for overlap in &merged.overlaps {
            let anchors: Vec<&str> = overlap.anchors().collect();
            println!("   - {} appears in: {}", overlap.name, anchors.join(", "));
        }
    }

    println!(
        "   Total systems after deduplication: {} ({} duplicates removed)",
        merged.systems.len(),
        merged.duplicates_removed()
    );

    for failure in &report.failures {
        println!("   ❌ {}: {}", failure.anchor, failure.message);
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
