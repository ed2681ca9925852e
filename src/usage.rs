//! Usage footprint estimation.
//!
//! Turns a (model, query type, quantity) request into a scaled footprint,
//! applying the same checks the request form enforces.

use crate::analysis::{equivalences, EquivalenceFactors, Equivalences};
use crate::dataset::ImpactDataset;
use crate::error::UsageError;
use crate::models::{ImpactStats, QueryType};
use serde::Serialize;
use tracing::debug;

/// A user's usage selection.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRequest {
    pub model: String,
    pub query_type: QueryType,
    pub quantity: f64,
}

impl UsageRequest {
    /// Check the request before any lookup. Quantities may be fractional
    /// (minutes of audio) but must be positive.
    pub fn validate(&self) -> Result<(), UsageError> {
        if self.model.trim().is_empty() {
            return Err(UsageError::EmptyModel);
        }
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(UsageError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Where the per-unit footprint of an estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseSource {
    /// A row recorded for this exact model and query type.
    Combination,
    /// The model's overall statistics.
    ModelAverage,
}

/// Footprint of a usage request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEstimate {
    pub model: String,
    pub query_type: QueryType,
    pub quantity: f64,
    pub unit: &'static str,
    pub base: ImpactStats,
    pub base_source: BaseSource,
    pub total: ImpactStats,
    pub equivalences: Equivalences,
}

/// Estimate the footprint of `request` against `dataset`.
pub fn estimate(
    dataset: &ImpactDataset,
    request: &UsageRequest,
    factors: &EquivalenceFactors,
) -> Result<UsageEstimate, UsageError> {
    request.validate()?;

    let (base, base_source) = match dataset.combination(&request.model, request.query_type) {
        Some(stats) => (*stats, BaseSource::Combination),
        None => {
            let stats = dataset
                .models
                .get(request.model.as_str())
                .ok_or_else(|| UsageError::UnknownModel(request.model.clone()))?;
            debug!(
                "No combination row for {} + {}, using model statistics",
                request.model, request.query_type
            );
            (*stats, BaseSource::ModelAverage)
        }
    };

    let total = base.scaled(request.quantity);
    let equivalences = equivalences(&request.model, &total, factors)?;

    Ok(UsageEstimate {
        model: request.model.clone(),
        query_type: request.query_type,
        quantity: request.quantity,
        unit: request.query_type.profile().unit,
        base,
        base_source,
        total,
        equivalences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawDataset;

    fn dataset() -> ImpactDataset {
        let raw: RawDataset =
            serde_json::from_str(include_str!("../fixtures/sample_stats.json")).unwrap();
        ImpactDataset::from_raw(raw).unwrap()
    }

    fn request(model: &str, query_type: QueryType, quantity: f64) -> UsageRequest {
        UsageRequest {
            model: model.to_string(),
            query_type,
            quantity,
        }
    }

    #[test]
    fn test_estimate_uses_combination() {
        let result = estimate(
            &dataset(),
            &request("GPT-4 Turbo", QueryType::Text, 5.0),
            &EquivalenceFactors::default(),
        )
        .unwrap();

        assert_eq!(result.base_source, BaseSource::Combination);
        assert!((result.total.water() - 3.75).abs() < 1e-9);
        assert!((result.total.energy() - 0.75).abs() < 1e-9);
        assert!((result.total.carbon() - 1.5).abs() < 1e-9);
        assert_eq!(result.unit, "queries");
    }

    #[test]
    fn test_estimate_falls_back_to_model_stats() {
        let result = estimate(
            &dataset(),
            &request("Gemini 1.5 Pro", QueryType::Code, 2.0),
            &EquivalenceFactors::default(),
        )
        .unwrap();

        assert_eq!(result.base_source, BaseSource::ModelAverage);
        assert_eq!(result.base, ImpactStats::new(0.95, 0.25, 0.55));
        assert!((result.total.water() - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_scales_linearly() {
        let ds = dataset();
        let factors = EquivalenceFactors::default();
        let one = estimate(&ds, &request("Claude 3 Opus", QueryType::Code, 1.0), &factors).unwrap();
        let ten = estimate(&ds, &request("Claude 3 Opus", QueryType::Code, 10.0), &factors).unwrap();

        assert!((ten.total.water() / one.total.water() - 10.0).abs() < 1e-9);
        assert!((ten.equivalences.glasses / one.equivalences.glasses - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_accepts_fractional_quantity() {
        let result = estimate(
            &dataset(),
            &request("Whisper Large V3", QueryType::Audio, 2.5),
            &EquivalenceFactors::default(),
        )
        .unwrap();
        assert_eq!(result.quantity, 2.5);
        assert_eq!(result.unit, "minutes");
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let ds = dataset();
        let factors = EquivalenceFactors::default();

        for quantity in [0.0, -5.0, f64::NAN] {
            let err = estimate(&ds, &request("GPT-4 Turbo", QueryType::Text, quantity), &factors)
                .unwrap_err();
            assert!(matches!(err, UsageError::InvalidQuantity(_)));
        }
    }

    #[test]
    fn test_rejects_unknown_model() {
        let err = estimate(
            &dataset(),
            &request("gpt-4 turbo", QueryType::Text, 1.0),
            &EquivalenceFactors::default(),
        )
        .unwrap_err();
        assert_eq!(err, UsageError::UnknownModel("gpt-4 turbo".to_string()));
    }

    #[test]
    fn test_rejects_empty_model() {
        let err = request(" ", QueryType::Text, 1.0).validate().unwrap_err();
        assert_eq!(err, UsageError::EmptyModel);
    }
}
