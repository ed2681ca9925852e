//! Dashboard views derived from the aggregator.
//!
//! Each function builds the data behind one dashboard panel and fails on its
//! own, so a panel without usable data never blocks the others.

use super::aggregator::{
    cumulative_projection, normalize_to_percent, percentage_of, rank_by_efficiency, sum_metric,
    total_impact,
};
use crate::error::ImpactError;
use crate::models::{ImpactStats, Metric, ModelStatsTable, QueryType, QueryTypeStatsTable};
use serde::Serialize;
use std::fmt;

/// Values of one metric, aligned with the view's labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub metric: Metric,
    pub unit: &'static str,
    pub values: Vec<f64>,
    pub total: f64,
}

/// Water, energy and carbon side by side for every model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub labels: Vec<String>,
    pub series: Vec<MetricSeries>,
}

/// Total footprint per query type, raw and rescaled to 0-100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTypeProfile {
    pub labels: Vec<QueryType>,
    pub totals: Vec<f64>,
    pub normalized: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyShare {
    pub query_type: QueryType,
    pub energy: f64,
    pub percentage: f64,
}

/// How total energy splits across query types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyDistribution {
    pub total_energy: f64,
    pub shares: Vec<EnergyShare>,
}

/// Reference quantities used to express a footprint in everyday terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquivalenceFactors {
    pub glass_liters: f64,
    pub bottle_liters: f64,
    pub shower_liters: f64,
    pub led_minutes_per_kwh: f64,
    pub car_grams_per_km: f64,
}

impl Default for EquivalenceFactors {
    fn default() -> Self {
        Self {
            glass_liters: 0.25,
            bottle_liters: 0.5,
            shower_liters: 75.0,
            led_minutes_per_kwh: 16.67,
            car_grams_per_km: 120.0,
        }
    }
}

/// A footprint expressed as glasses, bottles, showers, LED minutes and km.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equivalences {
    pub subject: String,
    pub footprint: ImpactStats,
    pub glasses: f64,
    pub bottles: f64,
    pub showers: f64,
    pub led_minutes: f64,
    pub car_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub multiplier: u64,
    pub label: String,
    pub impact: ImpactStats,
}

/// Footprint of one base selection at increasing usage volumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeImpact {
    pub subject: String,
    pub points: Vec<CumulativePoint>,
}

/// Qualitative bucket for an efficiency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyBand {
    High,
    Medium,
    Low,
}

impl EfficiencyBand {
    pub fn emoji(&self) -> &'static str {
        match self {
            EfficiencyBand::High => "🟢",
            EfficiencyBand::Medium => "🟡",
            EfficiencyBand::Low => "🔴",
        }
    }
}

impl fmt::Display for EfficiencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EfficiencyBand::High => write!(f, "High"),
            EfficiencyBand::Medium => write!(f, "Medium"),
            EfficiencyBand::Low => write!(f, "Low"),
        }
    }
}

/// Score thresholds separating the efficiency bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyBands {
    pub high_above: f64,
    pub medium_above: f64,
}

impl Default for EfficiencyBands {
    fn default() -> Self {
        Self {
            high_above: 40.0,
            medium_above: 30.0,
        }
    }
}

impl EfficiencyBands {
    pub fn classify(&self, score: f64) -> EfficiencyBand {
        if score > self.high_above {
            EfficiencyBand::High
        } else if score > self.medium_above {
            EfficiencyBand::Medium
        } else {
            EfficiencyBand::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyEntry {
    pub model: String,
    pub score: f64,
    pub band: EfficiencyBand,
}

/// Models ranked from most to least efficient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyIndex {
    pub entries: Vec<EfficiencyEntry>,
}

/// Grouped comparison of every metric across models.
pub fn model_comparison(models: &ModelStatsTable) -> Result<ModelComparison, ImpactError> {
    if models.is_empty() {
        return Err(ImpactError::EmptyInput {
            operation: "model_comparison",
        });
    }

    let series = Metric::ALL
        .into_iter()
        .map(|metric| MetricSeries {
            metric,
            unit: metric.unit(),
            values: models.values().map(|s| s.get(metric)).collect(),
            total: sum_metric(models, metric),
        })
        .collect();

    Ok(ModelComparison {
        labels: models.keys().cloned().collect(),
        series,
    })
}

pub fn query_type_profile(
    query_types: &QueryTypeStatsTable,
) -> Result<QueryTypeProfile, ImpactError> {
    let totals: Vec<f64> = query_types.values().map(total_impact).collect();
    let normalized = normalize_to_percent(&totals)?;

    Ok(QueryTypeProfile {
        labels: query_types.keys().copied().collect(),
        totals,
        normalized,
    })
}

pub fn energy_distribution(
    query_types: &QueryTypeStatsTable,
) -> Result<EnergyDistribution, ImpactError> {
    let energy: Vec<f64> = query_types.values().map(|s| s.energy()).collect();
    let percentages = percentage_of(&energy)?;

    let shares = query_types
        .keys()
        .zip(energy.iter().zip(percentages))
        .map(|(&query_type, (&energy, percentage))| EnergyShare {
            query_type,
            energy,
            percentage,
        })
        .collect();

    Ok(EnergyDistribution {
        total_energy: energy.iter().sum(),
        shares,
    })
}

/// Express `footprint` in everyday equivalents.
pub fn equivalences(
    subject: &str,
    footprint: &ImpactStats,
    factors: &EquivalenceFactors,
) -> Result<Equivalences, ImpactError> {
    let per = |value: f64, unit: f64| {
        if unit == 0.0 {
            Err(ImpactError::DivisionByZero {
                operation: "equivalences",
            })
        } else {
            Ok(value / unit)
        }
    };

    Ok(Equivalences {
        subject: subject.to_string(),
        footprint: *footprint,
        glasses: per(footprint.water(), factors.glass_liters)?,
        bottles: per(footprint.water(), factors.bottle_liters)?,
        showers: per(footprint.water(), factors.shower_liters)?,
        led_minutes: footprint.energy() * factors.led_minutes_per_kwh,
        car_km: per(footprint.carbon(), factors.car_grams_per_km)?,
    })
}

/// Equivalence card for the first model in display order.
pub fn reference_equivalences(
    models: &ModelStatsTable,
    factors: &EquivalenceFactors,
) -> Result<Equivalences, ImpactError> {
    let (model, stats) = models.first().ok_or(ImpactError::EmptyInput {
        operation: "reference_equivalences",
    })?;
    equivalences(model, stats, factors)
}

/// Project `base` over `multipliers`, labelling each point with `unit`.
pub fn cumulative_impact(
    subject: &str,
    base: &ImpactStats,
    multipliers: &[u64],
    unit: &str,
) -> Result<CumulativeImpact, ImpactError> {
    if multipliers.is_empty() {
        return Err(ImpactError::EmptyInput {
            operation: "cumulative_impact",
        });
    }

    let points = multipliers
        .iter()
        .zip(cumulative_projection(base, multipliers))
        .map(|(&multiplier, impact)| CumulativePoint {
            multiplier,
            label: format!("{} {}", multiplier, unit),
            impact,
        })
        .collect();

    Ok(CumulativeImpact {
        subject: subject.to_string(),
        points,
    })
}

pub fn efficiency_index(
    models: &ModelStatsTable,
    bands: &EfficiencyBands,
) -> Result<EfficiencyIndex, ImpactError> {
    let entries = rank_by_efficiency(models)?
        .into_iter()
        .map(|(model, score)| EfficiencyEntry {
            model,
            score,
            band: bands.classify(score),
        })
        .collect();

    Ok(EfficiencyIndex { entries })
}
