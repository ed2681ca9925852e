//! Statistics dataset loading and validation.
//!
//! The statistics provider hands over ordered id lists plus per-id maps. This
//! module checks that contract and turns it into ordered [`ImpactTable`]s.

use crate::error::DatasetError;
use crate::models::{ImpactStats, ModelStatsTable, QueryType, QueryTypeStatsTable};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Dataset as written by the provider, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataset {
    /// Model identifiers in display order.
    pub models: Vec<String>,

    /// Query type identifiers in display order.
    pub query_types: Vec<String>,

    pub model_stats: HashMap<String, ImpactStats>,

    pub query_type_stats: HashMap<String, ImpactStats>,

    /// Optional per-(model, query type) footprints.
    #[serde(default)]
    pub combinations: Vec<RawCombination>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCombination {
    pub model: String,
    pub query_type: String,
    pub water: f64,
    pub energy: f64,
    pub carbon: f64,
}

/// Footprint of one model answering one kind of query.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    pub model: String,
    pub query_type: QueryType,
    pub stats: ImpactStats,
}

/// Validated, read-only statistics snapshot.
#[derive(Debug, Clone, Default)]
pub struct ImpactDataset {
    pub models: ModelStatsTable,
    pub query_types: QueryTypeStatsTable,
    pub combinations: Vec<Combination>,
}

impl ImpactDataset {
    /// Load and validate a dataset file.
    ///
    /// `.toml` files are parsed as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset: {}", path.display()))?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let raw: RawDataset = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse dataset: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse dataset: {}", path.display()))?
        };

        let dataset = Self::from_raw(raw)
            .with_context(|| format!("Invalid dataset: {}", path.display()))?;

        info!(
            "Loaded {} models, {} query types, {} combinations",
            dataset.models.len(),
            dataset.query_types.len(),
            dataset.combinations.len()
        );

        Ok(dataset)
    }

    /// Build ordered tables from the provider's id lists and maps.
    pub fn from_raw(raw: RawDataset) -> Result<Self, DatasetError> {
        let mut models = ModelStatsTable::new();
        for id in &raw.models {
            if id.trim().is_empty() {
                return Err(DatasetError::EmptyIdentifier { field: "models" });
            }
            let stats = raw
                .model_stats
                .get(id)
                .ok_or_else(|| DatasetError::MissingModelStats(id.clone()))?;
            check_stats(id, stats)?;
            if !models.insert(id.clone(), *stats) {
                return Err(DatasetError::DuplicateModel(id.clone()));
            }
        }

        // Sorted so that collisions and warnings do not depend on hash order.
        let mut stat_entries: Vec<_> = raw.query_type_stats.iter().collect();
        stat_entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut parsed_stats: HashMap<QueryType, (&str, ImpactStats)> = HashMap::new();
        for (key, stats) in stat_entries {
            let query_type = match key.parse::<QueryType>() {
                Ok(query_type) => query_type,
                Err(_) => {
                    warn!("Ignoring statistics for unrecognised query type: {}", key);
                    continue;
                }
            };
            if parsed_stats
                .insert(query_type, (key.as_str(), *stats))
                .is_some()
            {
                return Err(DatasetError::DuplicateQueryType(query_type));
            }
        }

        let mut query_types = QueryTypeStatsTable::new();
        for id in &raw.query_types {
            if id.trim().is_empty() {
                return Err(DatasetError::EmptyIdentifier {
                    field: "queryTypes",
                });
            }
            let query_type: QueryType = id.parse()?;
            let (_, stats) = parsed_stats
                .get(&query_type)
                .ok_or(DatasetError::MissingQueryTypeStats(query_type))?;
            check_stats(id, stats)?;
            if !query_types.insert(query_type, *stats) {
                return Err(DatasetError::DuplicateQueryType(query_type));
            }
        }

        warn_unlisted(
            "model",
            raw.model_stats
                .keys()
                .filter(|k| !models.contains_key(k.as_str()))
                .map(String::as_str),
        );
        warn_unlisted(
            "query type",
            parsed_stats
                .iter()
                .filter(|(q, _)| !query_types.contains_key(*q))
                .map(|(_, (key, _))| *key),
        );

        let mut seen = HashSet::new();
        let mut combinations = Vec::with_capacity(raw.combinations.len());
        for row in raw.combinations {
            if !models.contains_key(row.model.as_str()) {
                return Err(DatasetError::UnknownCombinationModel(row.model));
            }
            let query_type: QueryType = row.query_type.parse()?;
            let stats = ImpactStats::new(row.water, row.energy, row.carbon);
            check_stats(&format!("{} + {}", row.model, query_type), &stats)?;
            if !seen.insert((row.model.clone(), query_type)) {
                return Err(DatasetError::DuplicateCombination {
                    model: row.model,
                    query_type,
                });
            }
            combinations.push(Combination {
                model: row.model,
                query_type,
                stats,
            });
        }

        debug!(
            "Dataset validated: {} models, {} query types",
            models.len(),
            query_types.len()
        );

        Ok(Self {
            models,
            query_types,
            combinations,
        })
    }

    /// Footprint recorded for a specific model and query type, if any.
    pub fn combination(&self, model: &str, query_type: QueryType) -> Option<&ImpactStats> {
        self.combinations
            .iter()
            .find(|c| c.model == model && c.query_type == query_type)
            .map(|c| &c.stats)
    }
}

fn check_stats(subject: &str, stats: &ImpactStats) -> Result<(), DatasetError> {
    match stats.first_invalid() {
        Some((metric, value)) => Err(DatasetError::InvalidValue {
            subject: subject.to_string(),
            metric,
            value,
        }),
        None => Ok(()),
    }
}

fn warn_unlisted<'a>(kind: &str, keys: impl Iterator<Item = &'a str>) {
    for key in keys {
        warn!("Ignoring statistics for unlisted {}: {}", kind, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnknownQueryType;
    use std::io::Write;

    const SAMPLE_JSON: &str = include_str!("../fixtures/sample_stats.json");
    const SAMPLE_TOML: &str = include_str!("../fixtures/sample_stats.toml");

    fn sample_raw() -> RawDataset {
        serde_json::from_str(SAMPLE_JSON).unwrap()
    }

    #[test]
    fn test_from_raw_preserves_listed_order() {
        let dataset = ImpactDataset::from_raw(sample_raw()).unwrap();

        let models: Vec<_> = dataset.models.keys().cloned().collect();
        assert_eq!(
            models,
            vec![
                "GPT-4 Turbo",
                "Claude 3 Opus",
                "Gemini 1.5 Pro",
                "Whisper Large V3"
            ]
        );
        let query_types: Vec<_> = dataset.query_types.keys().copied().collect();
        assert_eq!(query_types, QueryType::ALL.to_vec());
        assert_eq!(
            dataset.models.get("Claude 3 Opus"),
            Some(&ImpactStats::new(1.0, 0.28, 0.62))
        );
    }

    #[test]
    fn test_combination_lookup() {
        let dataset = ImpactDataset::from_raw(sample_raw()).unwrap();

        assert!(dataset.combination("GPT-4 Turbo", QueryType::Text).is_some());
        assert!(dataset
            .combination("Whisper Large V3", QueryType::Image)
            .is_none());
    }

    #[test]
    fn test_missing_model_stats() {
        let mut raw = sample_raw();
        raw.models.push("Mystery".to_string());

        assert_eq!(
            ImpactDataset::from_raw(raw).unwrap_err(),
            DatasetError::MissingModelStats("Mystery".to_string())
        );
    }

    #[test]
    fn test_duplicate_model() {
        let mut raw = sample_raw();
        raw.models.push("GPT-4 Turbo".to_string());

        assert_eq!(
            ImpactDataset::from_raw(raw).unwrap_err(),
            DatasetError::DuplicateModel("GPT-4 Turbo".to_string())
        );
    }

    #[test]
    fn test_empty_identifier() {
        let mut raw = sample_raw();
        raw.models.insert(0, "  ".to_string());

        assert_eq!(
            ImpactDataset::from_raw(raw).unwrap_err(),
            DatasetError::EmptyIdentifier { field: "models" }
        );
    }

    #[test]
    fn test_unknown_query_type() {
        let mut raw = sample_raw();
        raw.query_types.push("hologram".to_string());

        assert_eq!(
            ImpactDataset::from_raw(raw).unwrap_err(),
            DatasetError::UnknownQueryType(UnknownQueryType("hologram".to_string()))
        );
    }

    #[test]
    fn test_negative_value_rejected() {
        let mut raw = sample_raw();
        raw.model_stats
            .insert("GPT-4 Turbo".to_string(), ImpactStats::new(1.0, -0.1, 0.5));

        assert!(matches!(
            ImpactDataset::from_raw(raw),
            Err(DatasetError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_combination_for_unknown_model() {
        let mut raw = sample_raw();
        raw.combinations.push(RawCombination {
            model: "Nope".to_string(),
            query_type: "text".to_string(),
            water: 1.0,
            energy: 1.0,
            carbon: 1.0,
        });

        assert_eq!(
            ImpactDataset::from_raw(raw).unwrap_err(),
            DatasetError::UnknownCombinationModel("Nope".to_string())
        );
    }

    #[test]
    fn test_unlisted_stats_are_ignored() {
        let mut raw = sample_raw();
        raw.model_stats
            .insert("Unlisted".to_string(), ImpactStats::new(1.0, 1.0, 1.0));

        let dataset = ImpactDataset::from_raw(raw).unwrap();
        assert!(!dataset.models.contains_key("Unlisted"));
    }

    #[test]
    fn test_unlisted_query_type_stats_are_ignored() {
        let mut raw = sample_raw();
        raw.query_types.retain(|q| q != "video");
        raw.query_type_stats
            .insert("texto".to_string(), ImpactStats::new(0.7, 0.13, 0.27));

        let dataset = ImpactDataset::from_raw(raw).unwrap();
        assert_eq!(dataset.query_types.len(), 4);
        assert!(!dataset.query_types.contains_key(&QueryType::Video));
    }

    #[test]
    fn test_query_type_stats_differing_only_in_case() {
        let mut raw = sample_raw();
        raw.query_type_stats
            .insert("Text".to_string(), ImpactStats::new(9.0, 9.0, 9.0));

        for _ in 0..16 {
            assert_eq!(
                ImpactDataset::from_raw(raw.clone()).unwrap_err(),
                DatasetError::DuplicateQueryType(QueryType::Text)
            );
        }
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE_JSON.as_bytes()).unwrap();

        let dataset = ImpactDataset::load(&path).unwrap();
        assert_eq!(dataset.models.len(), 4);
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let dataset = ImpactDataset::load(&path).unwrap();
        assert_eq!(dataset.models.len(), 2);
        assert_eq!(dataset.query_types.len(), 2);
        assert_eq!(dataset.combinations.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImpactDataset::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset"));
    }
}
