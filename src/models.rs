//! Data models for the impact estimator.
//!
//! This module contains the value types shared by the aggregator, the
//! dataset loader and the report generator.

use crate::error::UnknownQueryType;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Environmental footprint of one unit of usage.
///
/// Water is in liters, energy in kWh and carbon in grams of CO2-equivalent.
/// Values are fixed at construction; use [`ImpactStats::scaled`] to derive
/// a new footprint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactStats {
    water: f64,
    energy: f64,
    carbon: f64,
}

impl ImpactStats {
    pub const fn new(water: f64, energy: f64, carbon: f64) -> Self {
        Self {
            water,
            energy,
            carbon,
        }
    }

    pub fn water(&self) -> f64 {
        self.water
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn carbon(&self) -> f64 {
        self.carbon
    }

    /// Returns the value of a single metric.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Water => self.water,
            Metric::Energy => self.energy,
            Metric::Carbon => self.carbon,
        }
    }

    /// Multiplies every metric by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.water * factor,
            self.energy * factor,
            self.carbon * factor,
        )
    }

    /// Returns the first metric that is negative or not finite.
    pub fn first_invalid(&self) -> Option<(Metric, f64)> {
        Metric::ALL
            .into_iter()
            .map(|m| (m, self.get(m)))
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
    }
}

/// One of the three tracked footprint dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Water,
    Energy,
    Carbon,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Water, Metric::Energy, Metric::Carbon];

    /// Unit suffix used in reports.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Water => "L",
            Metric::Energy => "kWh",
            Metric::Carbon => "gCO2e",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Metric::Water => "💧",
            Metric::Energy => "⚡",
            Metric::Carbon => "🌍",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Water => write!(f, "Water"),
            Metric::Energy => write!(f, "Energy"),
            Metric::Carbon => write!(f, "Carbon"),
        }
    }
}

/// Kind of request sent to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Text,
    Code,
    Image,
    Audio,
    Video,
}

/// How the quantity of a query type is described to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputProfile {
    pub hint: &'static str,
    pub unit: &'static str,
    pub label: &'static str,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        QueryType::Text,
        QueryType::Code,
        QueryType::Image,
        QueryType::Audio,
        QueryType::Video,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Text => "text",
            QueryType::Code => "code",
            QueryType::Image => "image",
            QueryType::Audio => "audio",
            QueryType::Video => "video",
        }
    }

    /// Returns the quantity hint, unit and label for this query type.
    pub fn profile(&self) -> InputProfile {
        match self {
            QueryType::Text => InputProfile {
                hint: "Number of plain text queries",
                unit: "queries",
                label: "Number of Queries",
            },
            QueryType::Code => InputProfile {
                hint: "Number of code blocks",
                unit: "blocks",
                label: "Number of Blocks",
            },
            QueryType::Image => InputProfile {
                hint: "Number of generated images",
                unit: "images",
                label: "Number of Images",
            },
            QueryType::Audio => InputProfile {
                hint: "Minutes of audio",
                unit: "minutes",
                label: "Audio Minutes",
            },
            QueryType::Video => InputProfile {
                hint: "Minutes of video",
                unit: "minutes",
                label: "Video Minutes",
            },
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = UnknownQueryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        QueryType::ALL
            .into_iter()
            .find(|q| q.as_str() == needle)
            .ok_or_else(|| UnknownQueryType(s.to_string()))
    }
}

/// Insertion-ordered mapping from a unique key to its footprint.
///
/// Iteration order is the order entries were inserted, which is also the
/// order views and reports display them in.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactTable<K> {
    entries: Vec<(K, ImpactStats)>,
}

/// Footprint per model identifier.
pub type ModelStatsTable = ImpactTable<String>;

/// Footprint per query type.
pub type QueryTypeStatsTable = ImpactTable<QueryType>;

impl<K> Default for ImpactTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq> ImpactTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Returns `false` and leaves the table unchanged if
    /// the key is already present.
    pub fn insert(&mut self, key: K, stats: ImpactStats) -> bool {
        if self.entries.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.entries.push((key, stats));
        true
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&ImpactStats>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries
            .iter()
            .find(|(k, _)| <K as Borrow<Q>>::borrow(k) == key)
            .map(|(_, stats)| stats)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K> ImpactTable<K> {
    pub fn iter(&self) -> impl Iterator<Item = (&K, &ImpactStats)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &ImpactStats> {
        self.entries.iter().map(|(_, s)| s)
    }

    /// First entry in display order.
    pub fn first(&self) -> Option<(&K, &ImpactStats)> {
        self.entries.first().map(|(k, s)| (k, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
