//! Feature Row and Vector Assembly

use crate::window::RollingSum;
use flood_data::{FloodLabel, MergedRecord, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Number of model input features
pub const FEATURE_DIMENSION: usize = 5;

/// Model input order. Changing it invalidates every exported model.
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "rainfall",
    "river_level",
    "rainfall_3day",
    "rainfall_7day",
    "river_rise",
];

/// Short rainfall window (days)
pub const SHORT_WINDOW: usize = 3;
/// Long rainfall window (days)
pub const LONG_WINDOW: usize = 7;

/// Feature vector for model inference, ordered as [`FEATURE_NAMES`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_DIMENSION],
}

impl FeatureVector {
    pub fn new(rainfall: f64, river_level: f64, rainfall_3day: f64, rainfall_7day: f64, river_rise: f64) -> Self {
        Self {
            values: [rainfall, river_level, rainfall_3day, rainfall_7day, river_rise],
        }
    }

    /// Build from a slice of exactly [`FEATURE_DIMENSION`] values
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; FEATURE_DIMENSION] = values.try_into().ok()?;
        Some(Self { values })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn rainfall(&self) -> f64 {
        self.values[0]
    }

    pub fn river_level(&self) -> f64 {
        self.values[1]
    }

    pub fn rainfall_3day(&self) -> f64 {
        self.values[2]
    }

    pub fn rainfall_7day(&self) -> f64 {
        self.values[3]
    }

    pub fn river_rise(&self) -> f64 {
        self.values[4]
    }
}

/// Heuristic flood score in [0, 1]
pub fn flood_score(rainfall_3day: f64, river_level: f64, river_rise: f64) -> f64 {
    let score = 0.4 * (rainfall_3day / 100.0) + 0.4 * (river_level / 10.0) + 0.2 * (river_rise / 2.0);
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// An observation with its derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub observation: Observation,
    pub label: FloodLabel,
    /// Rainfall over the current and 2 preceding days
    pub rainfall_3day: f64,
    /// Rainfall over the current and 6 preceding days
    pub rainfall_7day: f64,
    /// River level change since the previous day, 0 on the first day
    pub river_rise: f64,
    pub flood_score: f64,
}

impl FeatureRow {
    /// Model input vector for this row
    pub fn vector(&self) -> FeatureVector {
        FeatureVector::new(
            self.observation.rainfall_mm,
            self.observation.river_level_m,
            self.rainfall_3day,
            self.rainfall_7day,
            self.river_rise,
        )
    }
}

/// Per-city feature engineer.
///
/// Each city's observations are sorted by date and processed independently,
/// so a row's features only ever see earlier rows of the same city.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    short_window: usize,
    long_window: usize,
}

impl FeatureEngineer {
    pub fn new() -> Self {
        Self::with_windows(SHORT_WINDOW, LONG_WINDOW)
    }

    /// Engineer with custom rolling window lengths, each at least 1
    pub fn with_windows(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window: short_window.max(1),
            long_window: long_window.max(1),
        }
    }

    /// Engineer features for merged, labeled records
    pub fn engineer(&self, records: Vec<MergedRecord>) -> Vec<FeatureRow> {
        self.engineer_labeled(records.into_iter().map(|r| (r.observation, r.label)))
    }

    /// Engineer features for unlabeled observations
    pub fn engineer_observations(&self, observations: Vec<Observation>) -> Vec<FeatureRow> {
        self.engineer_labeled(observations.into_iter().map(|o| (o, FloodLabel::default())))
    }

    /// Rows come back grouped by city (lexical order), ascending by date
    fn engineer_labeled(&self, rows: impl Iterator<Item = (Observation, FloodLabel)>) -> Vec<FeatureRow> {
        let mut by_city: BTreeMap<String, Vec<(Observation, FloodLabel)>> = BTreeMap::new();
        for (observation, label) in rows {
            by_city
                .entry(observation.city.clone())
                .or_default()
                .push((observation, label));
        }

        let mut features = Vec::new();
        for (city, mut series) in by_city {
            series.sort_by_key(|(observation, _)| observation.date);
            debug!("Engineering {} rows for {}", series.len(), city);
            features.extend(self.engineer_city(series));
        }
        features
    }

    fn engineer_city(&self, series: Vec<(Observation, FloodLabel)>) -> Vec<FeatureRow> {
        let mut short = RollingSum::new(self.short_window);
        let mut long = RollingSum::new(self.long_window);
        let mut previous_level: Option<f64> = None;

        series
            .into_iter()
            .map(|(mut observation, label)| {
                let rainfall = finite(observation.rainfall_mm);
                let level = finite(observation.river_level_m);
                observation.rainfall_mm = rainfall;
                observation.river_level_m = level;

                let rainfall_3day = short.push(rainfall);
                let rainfall_7day = long.push(rainfall);
                let river_rise = previous_level.map_or(0.0, |p| level - p);
                previous_level = Some(level);

                FeatureRow {
                    flood_score: flood_score(rainfall_3day, level, river_rise),
                    observation,
                    label,
                    rainfall_3day,
                    rainfall_7day,
                    river_rise,
                }
            })
            .collect()
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Counts reported before training
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub samples: usize,
    pub flood_events: usize,
    pub cities: usize,
}

impl DatasetSummary {
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut cities: Vec<&str> = rows.iter().map(|r| r.observation.city.as_str()).collect();
        cities.sort_unstable();
        cities.dedup();

        Self {
            samples: rows.len(),
            flood_events: rows.iter().filter(|r| r.label.flood_occurred).count(),
            cities: cities.len(),
        }
    }
}
