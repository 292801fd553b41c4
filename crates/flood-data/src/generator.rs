//! Synthetic Dataset Generator
//!
//! Produces a year of daily rainfall and river level readings for a fixed set
//! of Indian cities, with a monsoon season and sparse positive flood events.

use crate::ingest::RawTables;
use crate::records::{FloodRecordRow, FloodSeverity, LocationRow, RainfallRow, RiverLevelRow, DATE_FORMAT};
use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Cities with (name, state, latitude, longitude)
pub const CITIES: [(&str, &str, f64, f64); 10] = [
    ("Mumbai", "Maharashtra", 19.0760, 72.8777),
    ("Delhi", "Delhi", 28.7041, 77.1025),
    ("Kolkata", "West Bengal", 22.5726, 88.3639),
    ("Chennai", "Tamil Nadu", 13.0827, 80.2707),
    ("Bangalore", "Karnataka", 12.9716, 77.5946),
    ("Hyderabad", "Telangana", 17.3850, 78.4867),
    ("Ahmedabad", "Gujarat", 23.0225, 72.5714),
    ("Pune", "Maharashtra", 18.5204, 73.8567),
    ("Surat", "Gujarat", 21.1702, 72.8311),
    ("Jaipur", "Rajasthan", 26.9124, 75.7873),
];

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// First generated day
    pub start_date: NaiveDate,
    /// Number of consecutive days
    pub days: u32,
    /// RNG seed
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 365,
            seed: 42,
        }
    }
}

/// Generate the four raw tables
pub fn generate(config: &GeneratorConfig) -> RawTables {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut tables = RawTables {
        locations: CITIES
            .iter()
            .map(|&(city, state, latitude, longitude)| LocationRow {
                city: city.to_string(),
                state: state.to_string(),
                latitude,
                longitude,
            })
            .collect(),
        ..Default::default()
    };

    for day in 0..config.days {
        let date = config.start_date + Duration::days(i64::from(day));
        let date_str = date.format(DATE_FORMAT).to_string();
        let monsoon = (6..=9).contains(&date.month());
        let (base_rainfall, base_level) = if monsoon { (50.0, 5.0) } else { (10.0, 2.0) };

        for &(city, ..) in &CITIES {
            let rainfall = round_to(sample_normal(&mut rng, base_rainfall, 20.0).max(0.0), 2);
            let river_level = round_to(sample_normal(&mut rng, base_level, 1.5).max(0.0), 2);

            tables.rainfall.push(RainfallRow {
                date: date_str.clone(),
                city: city.to_string(),
                rainfall,
            });
            tables.river_levels.push(RiverLevelRow {
                date: date_str.clone(),
                city: city.to_string(),
                river_level,
            });

            let flood_probability = if rainfall > 80.0 && river_level > 7.0 { 0.15 } else { 0.02 };
            if rng.gen::<f64>() < flood_probability {
                let severity = FloodSeverity::ALL[rng.gen_range(0..FloodSeverity::ALL.len())];
                tables.flood_records.push(FloodRecordRow {
                    date: date_str.clone(),
                    city: city.to_string(),
                    flood_occurred: 1,
                    severity: Some(severity.as_str().to_string()),
                });
            }
        }
    }

    info!(
        "Generated {} cities x {} days, {} flood events",
        CITIES.len(),
        config.days,
        tables.flood_records.len()
    );
    tables
}

/// Box-Muller normal sample
pub fn sample_normal<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
