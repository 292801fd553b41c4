//! Raw Table Rows and the Merged Observation Model

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Date format used by every input table
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Row of `rainfall.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallRow {
    pub date: String,
    pub city: String,
    /// Daily rainfall (mm), zero when missing or non-numeric
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rainfall: f64,
}

/// Row of `river_levels.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverLevelRow {
    pub date: String,
    pub city: String,
    /// River level (m), zero when missing or non-numeric
    #[serde(default, deserialize_with = "lenient_f64")]
    pub river_level: f64,
}

/// Row of `flood_records.csv`. The table only lists positive events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodRecordRow {
    pub date: String,
    pub city: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub flood_occurred: u8,
    #[serde(default)]
    pub severity: Option<String>,
}

/// Row of `locations.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: f64,
}

/// Raw daily measurement for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub city: String,
    pub rainfall_mm: f64,
    pub river_level_m: f64,
}

impl Observation {
    /// Build an observation, zeroing non-finite measurements
    pub fn new(date: NaiveDate, city: impl Into<String>, rainfall_mm: f64, river_level_m: f64) -> Self {
        Self {
            date,
            city: city.into(),
            rainfall_mm: finite_or_zero(rainfall_mm),
            river_level_m: finite_or_zero(river_level_m),
        }
    }
}

/// Recorded flood severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodSeverity {
    Minor,
    Moderate,
    Severe,
}

impl FloodSeverity {
    pub const ALL: [FloodSeverity; 3] = [Self::Minor, Self::Moderate, Self::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            FloodSeverity::Minor => "minor",
            FloodSeverity::Moderate => "moderate",
            FloodSeverity::Severe => "severe",
        }
    }
}

impl fmt::Display for FloodSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FloodSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Self::Minor),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(format!("unknown flood severity '{other}'")),
        }
    }
}

/// Flood outcome for an observation. Unrecorded days are not flooded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloodLabel {
    pub flood_occurred: bool,
    pub severity: Option<FloodSeverity>,
}

impl FloodLabel {
    /// Label value used as a training target (1.0 = flooded)
    pub fn as_target(&self) -> f64 {
        if self.flood_occurred {
            1.0
        } else {
            0.0
        }
    }
}

/// City metadata joined onto each observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of the merged table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub observation: Observation,
    pub label: FloodLabel,
    pub location: Location,
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn parse_lenient(raw: Option<String>) -> f64 {
    raw.as_deref()
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .map(finite_or_zero)
        .unwrap_or(0.0)
}

/// Missing, empty, non-numeric and non-finite cells all read as 0.0
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(parse_lenient(raw))
}

/// Any non-zero numeric cell reads as 1, everything else as 0
pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(u8::from(parse_lenient(raw) != 0.0))
}
