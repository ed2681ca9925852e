//! Impact aggregation and scoring.
//!
//! Stateless numeric transforms over [`ImpactStats`] tables. Nothing here
//! formats or rounds; zero denominators and empty inputs are reported as
//! [`ImpactError`] instead of leaking NaN or infinity to the caller.

use crate::error::ImpactError;
use crate::models::{ImpactStats, ImpactTable, Metric};
use std::cmp::Ordering;
use tracing::debug;

/// Sum of the three metrics.
///
/// The units differ (liters, kWh, grams); the sum is a ranking heuristic,
/// not a physical quantity.
pub fn total_impact(stats: &ImpactStats) -> f64 {
    stats.water() + stats.energy() + stats.carbon()
}

/// Sum one metric across every entry. An empty table sums to `0.0`.
pub fn sum_metric<K>(table: &ImpactTable<K>, metric: Metric) -> f64 {
    table.values().map(|s| s.get(metric)).sum()
}

/// Share of each value in the total, as a percentage.
pub fn percentage_of(values: &[f64]) -> Result<Vec<f64>, ImpactError> {
    if values.is_empty() {
        return Err(ImpactError::EmptyInput {
            operation: "percentage_of",
        });
    }

    let total: f64 = values.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(ImpactError::DivisionByZero {
            operation: "percentage_of",
        });
    }

    Ok(values.iter().map(|v| v / total * 100.0).collect())
}

/// Linearly rescale `values` into `out_min..=out_max`.
///
/// When every value is equal the range is taken as 1, so every output is
/// `out_min`.
pub fn normalize_min_max(
    values: &[f64],
    out_min: f64,
    out_max: f64,
) -> Result<Vec<f64>, ImpactError> {
    if values.is_empty() {
        return Err(ImpactError::EmptyInput {
            operation: "normalize_min_max",
        });
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max - min == 0.0 { 1.0 } else { max - min };
    let span = out_max - out_min;

    Ok(values
        .iter()
        .map(|v| ((v - min) / range) * span + out_min)
        .collect())
}

/// [`normalize_min_max`] onto the 0-100 scale.
pub fn normalize_to_percent(values: &[f64]) -> Result<Vec<f64>, ImpactError> {
    normalize_min_max(values, 0.0, 100.0)
}

/// `100 / total_impact`. Higher is better.
///
/// A zero footprint is a data error, not an infinitely efficient model. A
/// total so small that the score overflows is treated the same way.
pub fn efficiency_score(stats: &ImpactStats) -> Result<f64, ImpactError> {
    let total = total_impact(stats);
    let score = 100.0 / total;
    if total == 0.0 || !score.is_finite() {
        return Err(ImpactError::DivisionByZero {
            operation: "efficiency_score",
        });
    }
    Ok(score)
}

/// Score every entry and sort by descending efficiency.
///
/// The sort is stable: entries with equal scores keep their insertion order.
pub fn rank_by_efficiency<K: Clone>(
    table: &ImpactTable<K>,
) -> Result<Vec<(K, f64)>, ImpactError> {
    if table.is_empty() {
        return Err(ImpactError::EmptyInput {
            operation: "rank_by_efficiency",
        });
    }

    let mut ranked = table
        .iter()
        .map(|(key, stats)| efficiency_score(stats).map(|score| (key.clone(), score)))
        .collect::<Result<Vec<_>, _>>()?;

    // Scores are finite here, so partial_cmp never returns None.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    debug!("Ranked {} entries by efficiency", ranked.len());
    Ok(ranked)
}

/// Scale a base footprint by each usage multiplier, in order.
pub fn cumulative_projection(base: &ImpactStats, multipliers: &[u64]) -> Vec<ImpactStats> {
    multipliers.iter().map(|&m| base.scaled(m as f64)).collect()
}
