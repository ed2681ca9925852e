//! Dashboard report assembly and rendering.

pub mod generator;

pub use generator::*;

use crate::analysis::{
    self, CumulativeImpact, EfficiencyIndex, EnergyDistribution, EquivalenceFactors, Equivalences,
    ModelComparison, QueryTypeProfile,
};
use crate::config::Config;
use crate::dataset::ImpactDataset;
use crate::error::ImpactError;
use crate::usage::UsageEstimate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// A view that was either computed or could not be.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    Ready(T),
    Unavailable { reason: String },
}

impl<T> ViewOutcome<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ViewOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewOutcome::Ready(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ViewOutcome::Ready(_) => None,
            ViewOutcome::Unavailable { reason } => Some(reason.as_str()),
        }
    }
}

impl<T> From<Result<T, ImpactError>> for ViewOutcome<T> {
    fn from(result: Result<T, ImpactError>) -> Self {
        match result {
            Ok(view) => ViewOutcome::Ready(view),
            Err(e) => ViewOutcome::unavailable(e.to_string()),
        }
    }
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Where the statistics came from.
    pub dataset: String,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub models: usize,
    pub query_types: usize,
}

/// Every dashboard view for one dataset snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub model_comparison: ViewOutcome<ModelComparison>,
    pub query_type_profile: ViewOutcome<QueryTypeProfile>,
    pub energy_distribution: ViewOutcome<EnergyDistribution>,
    pub equivalences: ViewOutcome<Equivalences>,
    pub cumulative_impact: ViewOutcome<CumulativeImpact>,
    pub efficiency_index: ViewOutcome<EfficiencyIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageEstimate>,
}

impl DashboardReport {
    /// Compute every view. A view that fails is recorded as unavailable.
    pub fn build(dataset: &ImpactDataset, config: &Config, source: &str) -> Self {
        let factors = EquivalenceFactors::from(&config.equivalences);

        let report = Self {
            metadata: ReportMetadata {
                dataset: source.to_string(),
                generated_at: Utc::now(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                models: dataset.models.len(),
                query_types: dataset.query_types.len(),
            },
            model_comparison: analysis::model_comparison(&dataset.models).into(),
            query_type_profile: analysis::query_type_profile(&dataset.query_types).into(),
            energy_distribution: analysis::energy_distribution(&dataset.query_types).into(),
            equivalences: analysis::reference_equivalences(&dataset.models, &factors).into(),
            cumulative_impact: build_cumulative(dataset, config),
            efficiency_index: analysis::efficiency_index(&dataset.models, &config.report.bands())
                .into(),
            usage: None,
        };

        for (name, reason) in report.unavailable_views() {
            warn!("View '{}' unavailable: {}", name, reason);
        }

        report
    }

    pub fn with_usage(mut self, estimate: UsageEstimate) -> Self {
        self.usage = Some(estimate);
        self
    }

    /// Names and reasons of views that could not be computed.
    pub fn unavailable_views(&self) -> Vec<(&'static str, &str)> {
        [
            ("model_comparison", self.model_comparison.reason()),
            ("query_type_profile", self.query_type_profile.reason()),
            ("energy_distribution", self.energy_distribution.reason()),
            ("equivalences", self.equivalences.reason()),
            ("cumulative_impact", self.cumulative_impact.reason()),
            ("efficiency_index", self.efficiency_index.reason()),
        ]
        .into_iter()
        .filter_map(|(name, reason)| reason.map(|r| (name, r)))
        .collect()
    }
}

/// Pick the projection base: the model's combination row when configured and
/// present, otherwise the query type's statistics.
fn build_cumulative(dataset: &ImpactDataset, config: &Config) -> ViewOutcome<CumulativeImpact> {
    let projection = &config.projection;
    let query_type = projection.query_type;
    let unit = query_type.profile().unit;

    let combination = projection.model.as_deref().and_then(|model| {
        dataset
            .combination(model, query_type)
            .map(|stats| (format!("{} + {}", model, query_type), *stats))
    });

    let (subject, base) = match combination {
        Some(found) => found,
        None => match dataset.query_types.get(&query_type) {
            Some(stats) => (query_type.to_string(), *stats),
            None => {
                return ViewOutcome::unavailable(format!(
                    "no statistics for query type '{}'",
                    query_type
                ))
            }
        },
    };

    analysis::cumulative_impact(&subject, &base, &projection.multipliers, unit).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawDataset;
    use crate::models::QueryType;

    fn dataset() -> ImpactDataset {
        let raw: RawDataset =
            serde_json::from_str(include_str!("../../fixtures/sample_stats.json")).unwrap();
        ImpactDataset::from_raw(raw).unwrap()
    }

    #[test]
    fn test_build_all_views_ready() {
        let report = DashboardReport::build(&dataset(), &Config::default(), "sample.json");

        assert!(report.unavailable_views().is_empty());
        assert_eq!(report.metadata.models, 4);
        assert_eq!(report.metadata.query_types, 5);
        match &report.cumulative_impact {
            ViewOutcome::Ready(view) => {
                assert_eq!(view.subject, "text");
                assert_eq!(view.points.len(), 5);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cumulative_prefers_combination() {
        let mut config = Config::default();
        config.projection.model = Some("Claude 3 Opus".to_string());

        let report = DashboardReport::build(&dataset(), &config, "sample.json");
        match &report.cumulative_impact {
            ViewOutcome::Ready(view) => {
                assert_eq!(view.subject, "Claude 3 Opus + text");
                assert!((view.points[0].impact.water() - 0.6).abs() < 1e-9);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failed_view_does_not_block_others() {
        let mut ds = dataset();
        ds.query_types = Default::default();
        ds.query_types
            .insert(QueryType::Text, crate::models::ImpactStats::new(1.0, 0.0, 1.0));

        let report = DashboardReport::build(&ds, &Config::default(), "sample.json");
        let unavailable = report.unavailable_views();

        assert_eq!(unavailable.len(), 1);
        assert_eq!(unavailable[0].0, "energy_distribution");
        assert!(report.model_comparison.is_ready());
        assert!(report.efficiency_index.is_ready());
    }

    #[test]
    fn test_missing_projection_query_type() {
        let mut config = Config::default();
        config.projection.query_type = QueryType::Video;
        let mut ds = dataset();
        ds.query_types = Default::default();
        ds.query_types
            .insert(QueryType::Text, crate::models::ImpactStats::new(1.0, 1.0, 1.0));

        let report = DashboardReport::build(&ds, &config, "sample.json");
        assert!(report
            .cumulative_impact
            .reason()
            .is_some_and(|r| r.contains("video")));
    }

    #[test]
    fn test_view_outcome_from_error() {
        let outcome: ViewOutcome<f64> = Err(ImpactError::EmptyInput {
            operation: "percentage_of",
        })
        .into();
        assert!(!outcome.is_ready());
        assert!(outcome.reason().is_some());
    }
}
