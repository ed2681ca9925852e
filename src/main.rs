//! EcoImpact - environmental footprint of AI model usage
//!
//! A CLI tool that turns a water/energy/carbon statistics dataset into a
//! dashboard report and estimates the footprint of individual usage requests.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable or invalid dataset, etc.)
//!   2 - At least one view was unavailable and --strict was set

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod report;
mod usage;

use anyhow::{anyhow, Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use dataset::ImpactDataset;
use report::DashboardReport;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use usage::UsageRequest;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("EcoImpact v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ecoimpact.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize projections, equivalences and report output.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Build the report and write it. Returns the exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let dataset_path = resolve_dataset(&config)?;
    println!("📥 Loading statistics: {}", dataset_path.display());
    let dataset = ImpactDataset::load(&dataset_path)?;

    println!("📊 Computing dashboard views...");
    let mut report = DashboardReport::build(&dataset, &config, &dataset_path.display().to_string());

    if let Some(request) = usage_request(&args) {
        let factors = analysis::EquivalenceFactors::from(&config.equivalences);
        let estimate = usage::estimate(&dataset, &request, &factors)
            .with_context(|| format!("Failed to estimate usage for '{}'", request.model))?;
        report = report.with_usage(estimate);
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, config.report.decimals),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&report, config.report.decimals);
    println!("\n✅ Report saved to: {}", output_path.display());

    let unavailable = report.unavailable_views();
    if args.strict && !unavailable.is_empty() {
        eprintln!(
            "\n⛔ {} view(s) could not be computed. Failing (exit code 2).",
            unavailable.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Console summary of the headline numbers.
fn print_summary(report: &DashboardReport, decimals: usize) {
    println!("\n📊 Summary:");
    println!(
        "   Models: {} | Query types: {}",
        report.metadata.models, report.metadata.query_types
    );

    let views = [
        report.model_comparison.is_ready(),
        report.query_type_profile.is_ready(),
        report.energy_distribution.is_ready(),
        report.equivalences.is_ready(),
        report.cumulative_impact.is_ready(),
        report.efficiency_index.is_ready(),
    ];
    println!(
        "   Views ready: {}/{}",
        views.iter().filter(|ready| **ready).count(),
        views.len()
    );

    if let report::ViewOutcome::Ready(ref index) = report.efficiency_index {
        if let Some(best) = index.entries.first() {
            println!(
                "   Most efficient: {} (score {})",
                best.model,
                report::format_value(best.score, decimals)
            );
        }
    }

    if let Some(ref usage) = report.usage {
        println!(
            "   Usage: {} {} on {} → {} L, {} kWh, {} gCO2e",
            report::format_quantity(usage.quantity),
            usage.unit,
            usage.model,
            report::format_value(usage.total.water(), decimals),
            report::format_value(usage.total.energy(), decimals),
            report::format_value(usage.total.carbon(), decimals)
        );
    }

    for (name, reason) in report.unavailable_views() {
        println!("   ⚠️  {} unavailable: {}", name, reason);
    }
}

/// Usage request from the CLI, if one was given.
fn usage_request(args: &Args) -> Option<UsageRequest> {
    // clap enforces that all three are present together
    match (&args.model, args.query_type, args.quantity) {
        (Some(model), Some(query_type), Some(quantity)) => Some(UsageRequest {
            model: model.clone(),
            query_type,
            quantity,
        }),
        _ => None,
    }
}

/// Dataset path from CLI or config.
fn resolve_dataset(config: &Config) -> Result<PathBuf> {
    config.general.dataset.clone().ok_or_else(|| {
        anyhow!(
            "No dataset given. Pass --stats <FILE> or set general.dataset in {}",
            CONFIG_FILE_NAME
        )
    })
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
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
