//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ecoimpact.toml` files.

use crate::analysis::{EfficiencyBands, EquivalenceFactors};
use crate::models::QueryType;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".ecoimpact.toml";

/// Upper bound for `report.decimals` and `--decimals`.
pub const MAX_DECIMALS: usize = 10;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cumulative projection settings.
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// Everyday equivalence factors.
    #[serde(default)]
    pub equivalences: EquivalencesConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Dataset used when `--stats` is not given.
    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            dataset: None,
        }
    }
}

fn default_output() -> String {
    "ecoimpact_report.md".to_string()
}

/// Cumulative projection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Usage volumes to project the base footprint over.
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<u64>,

    /// Query type whose footprint is projected.
    #[serde(default = "default_projection_query_type")]
    pub query_type: QueryType,

    /// Narrow the projection to one model's combination row, when present.
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            multipliers: default_multipliers(),
            query_type: default_projection_query_type(),
            model: None,
        }
    }
}

fn default_multipliers() -> Vec<u64> {
    vec![1, 10, 100, 1000, 10000]
}

fn default_projection_query_type() -> QueryType {
    QueryType::Text
}

/// Reference quantities for everyday equivalents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquivalencesConfig {
    /// Liters in a glass of water.
    #[serde(default = "default_glass_liters")]
    pub glass_liters: f64,

    /// Liters in a bottle.
    #[serde(default = "default_bottle_liters")]
    pub bottle_liters: f64,

    /// Liters used by one shower.
    #[serde(default = "default_shower_liters")]
    pub shower_liters: f64,

    /// Minutes an LED bulb runs on one kWh.
    #[serde(default = "default_led_minutes")]
    pub led_minutes_per_kwh: f64,

    /// Grams of CO2e emitted per km driven.
    #[serde(default = "default_car_grams")]
    pub car_grams_per_km: f64,
}

impl Default for EquivalencesConfig {
    fn default() -> Self {
        Self {
            glass_liters: default_glass_liters(),
            bottle_liters: default_bottle_liters(),
            shower_liters: default_shower_liters(),
            led_minutes_per_kwh: default_led_minutes(),
            car_grams_per_km: default_car_grams(),
        }
    }
}

fn default_glass_liters() -> f64 {
    0.25
}

fn default_bottle_liters() -> f64 {
    0.5
}

fn default_shower_liters() -> f64 {
    75.0
}

fn default_led_minutes() -> f64 {
    16.67
}

fn default_car_grams() -> f64 {
    120.0
}

impl From<&EquivalencesConfig> for EquivalenceFactors {
    fn from(config: &EquivalencesConfig) -> Self {
        Self {
            glass_liters: config.glass_liters,
            bottle_liters: config.bottle_liters,
            shower_liters: config.shower_liters,
            led_minutes_per_kwh: config.led_minutes_per_kwh,
            car_grams_per_km: config.car_grams_per_km,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for values in the Markdown report.
    #[serde(default = "default_decimals")]
    pub decimals: usize,

    /// Efficiency scores above this are rated high.
    #[serde(default = "default_high_efficiency")]
    pub high_efficiency_above: f64,

    /// Efficiency scores above this (and not high) are rated medium.
    #[serde(default = "default_medium_efficiency")]
    pub medium_efficiency_above: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            high_efficiency_above: default_high_efficiency(),
            medium_efficiency_above: default_medium_efficiency(),
        }
    }
}

fn default_decimals() -> usize {
    2
}

fn default_high_efficiency() -> f64 {
    40.0
}

fn default_medium_efficiency() -> f64 {
    30.0
}

impl ReportConfig {
    pub fn bands(&self) -> EfficiencyBands {
        EfficiencyBands {
            high_above: self.high_efficiency_above,
            medium_above: self.medium_efficiency_above,
        }
    }
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.ecoimpact.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref stats) = args.stats {
            self.general.dataset = Some(stats.clone());
        }

        if let Some(ref multipliers) = args.multipliers {
            self.projection.multipliers = multipliers.clone();
        }
        if let Some(query_type) = args.projection_query_type {
            self.projection.query_type = query_type;
        }
        if let Some(ref model) = args.projection_model {
            self.projection.model = Some(model.clone());
        }

        if let Some(decimals) = args.decimals {
            self.report.decimals = decimals;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject settings the views cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.projection.multipliers.contains(&0) {
            bail!("Projection multipliers must be positive integers");
        }

        let eq = &self.equivalences;
        let factors = [
            ("glass_liters", eq.glass_liters),
            ("bottle_liters", eq.bottle_liters),
            ("shower_liters", eq.shower_liters),
            ("led_minutes_per_kwh", eq.led_minutes_per_kwh),
            ("car_grams_per_km", eq.car_grams_per_km),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value <= 0.0 {
                bail!("Equivalence factor {} must be a positive number", name);
            }
        }

        if self.report.decimals > MAX_DECIMALS {
            bail!("Report decimals must be between 0 and {}", MAX_DECIMALS);
        }

        let thresholds = [
            ("high_efficiency_above", self.report.high_efficiency_above),
            ("medium_efficiency_above", self.report.medium_efficiency_above),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                bail!("Efficiency threshold {} must be a finite number", name);
            }
        }

        if self.report.medium_efficiency_above > self.report.high_efficiency_above {
            bail!("medium_efficiency_above cannot exceed high_efficiency_above");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
