//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::MAX_DECIMALS;
use crate::models::QueryType;
use clap::Parser;
use std::path::PathBuf;

/// EcoImpact - environmental footprint of AI model usage
///
/// Reads a statistics dataset (water, energy and carbon per model and per
/// query type) and writes a dashboard report: model comparison, query type
/// profile, energy distribution, equivalences, cumulative projection and
/// efficiency ranking. Optionally estimates a single usage request.
///
/// Examples:
///   ecoimpact --stats stats.json
///   ecoimpact --stats stats.json --format json --output report.json
///   ecoimpact --stats stats.json --model "GPT-4 Turbo" --query-type text --quantity 5
///   ecoimpact --stats stats.json --multipliers 1,10,100 --projection-query-type image
///   ecoimpact --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Statistics dataset to read (JSON, or TOML with a .toml extension)
    ///
    /// Falls back to `general.dataset` in .ecoimpact.toml.
    #[arg(short, long, value_name = "FILE", env = "ECOIMPACT_STATS")]
    pub stats: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to `general.output` from the config (ecoimpact_report.md).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ecoimpact.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Model to estimate a usage request for
    #[arg(short, long, value_name = "MODEL", requires = "query_type", requires = "quantity")]
    pub model: Option<String>,

    /// Query type of the usage request (text, code, image, audio, video)
    #[arg(long, value_name = "TYPE", requires = "model")]
    pub query_type: Option<QueryType>,

    /// Quantity of the usage request (queries, blocks, images or minutes)
    #[arg(long, value_name = "AMOUNT", requires = "model")]
    pub quantity: Option<f64>,

    /// Usage volumes for the cumulative projection (comma-separated)
    ///
    /// Example: --multipliers 1,10,100,1000
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub multipliers: Option<Vec<u64>>,

    /// Query type whose footprint is projected
    #[arg(long, value_name = "TYPE")]
    pub projection_query_type: Option<QueryType>,

    /// Use this model's combination row for the projection when one exists
    #[arg(long, value_name = "MODEL")]
    pub projection_model: Option<String>,

    /// Decimal places for values in the Markdown report
    #[arg(long, value_name = "N")]
    pub decimals: Option<usize>,

    /// Exit with code 2 if any dashboard view could not be computed
    #[arg(long)]
    pub strict: bool,

    /// Generate a default .ecoimpact.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(quantity) = self.quantity {
            if !quantity.is_finite() || quantity <= 0.0 {
                return Err("Quantity must be a positive number".to_string());
            }
        }

        if let Some(ref multipliers) = self.multipliers {
            if multipliers.is_empty() {
                return Err("At least one multiplier is required".to_string());
            }
            if multipliers.contains(&0) {
                return Err("Multipliers must be positive integers".to_string());
            }
        }

        if let Some(decimals) = self.decimals {
            if decimals > MAX_DECIMALS {
                return Err(format!("Decimals must be between 0 and {}", MAX_DECIMALS));
            }
        }

        if let Some(ref stats) = self.stats {
            if !stats.is_file() {
                return Err(format!("Dataset file does not exist: {}", stats.display()));
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

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            stats: None,
            output: None,
            format: OutputFormat::Markdown,
            config: None,
            verbose: false,
            quiet: false,
            model: None,
            query_type: None,
            quantity: None,
            multipliers: None,
            projection_query_type: None,
            projection_model: None,
            decimals: None,
            strict: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_usage_flags() {
        let args = Args::try_parse_from([
            "ecoimpact",
            "--model",
            "GPT-4 Turbo",
            "--query-type",
            "image",
            "--quantity",
            "2.5",
            "--multipliers",
            "1,10,100",
        ])
        .unwrap();

        assert_eq!(args.model.as_deref(), Some("GPT-4 Turbo"));
        assert_eq!(args.query_type, Some(QueryType::Image));
        assert_eq!(args.quantity, Some(2.5));
        assert_eq!(args.multipliers, Some(vec![1, 10, 100]));
    }

    #[test]
    fn test_model_requires_query_type_and_quantity() {
        assert!(Args::try_parse_from(["ecoimpact", "--model", "GPT-4 Turbo"]).is_err());
        assert!(Args::try_parse_from(["ecoimpact", "--quantity", "3"]).is_err());
    }

    #[test]
    fn test_unknown_query_type_rejected() {
        let result = Args::try_parse_from([
            "ecoimpact",
            "--projection-query-type",
            "hologram",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_quantity() {
        let mut args = make_args();
        args.quantity = Some(0.0);
        assert!(args.validate().is_err());

        args.quantity = Some(-3.0);
        assert!(args.validate().is_err());

        args.quantity = Some(1.5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_multipliers() {
        let mut args = make_args();
        args.multipliers = Some(vec![1, 0]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_dataset() {
        let mut args = make_args();
        args.stats = Some(PathBuf::from("definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
