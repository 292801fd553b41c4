//! CSV Loading and Table Merge

use crate::error::DataError;
use crate::records::{
    FloodLabel, FloodRecordRow, FloodSeverity, Location, LocationRow, MergedRecord, Observation,
    RainfallRow, RiverLevelRow, DATE_FORMAT,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Locations of the four input tables
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources {
    pub rainfall: PathBuf,
    pub river_levels: PathBuf,
    pub flood_records: PathBuf,
    pub locations: PathBuf,
}

impl DataSources {
    /// Standard file names inside a data directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            rainfall: dir.join("rainfall.csv"),
            river_levels: dir.join("river_levels.csv"),
            flood_records: dir.join("flood_records.csv"),
            locations: dir.join("locations.csv"),
        }
    }

    /// Load all four tables. Any missing file is an error.
    pub fn load(&self) -> Result<RawTables, DataError> {
        let tables = RawTables {
            rainfall: read_file(&self.rainfall, "rainfall")?,
            river_levels: read_file(&self.river_levels, "river_levels")?,
            flood_records: read_file(&self.flood_records, "flood_records")?,
            locations: read_file(&self.locations, "locations")?,
        };
        info!(
            "Loaded tables: rainfall={}, river_levels={}, flood_records={}, locations={}",
            tables.rainfall.len(),
            tables.river_levels.len(),
            tables.flood_records.len(),
            tables.locations.len()
        );
        Ok(tables)
    }

    /// Load only the locations table
    pub fn load_locations(&self) -> Result<Vec<LocationRow>, DataError> {
        read_file(&self.locations, "locations")
    }
}

/// The raw input tables, as read from disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTables {
    pub rainfall: Vec<RainfallRow>,
    pub river_levels: Vec<RiverLevelRow>,
    pub flood_records: Vec<FloodRecordRow>,
    pub locations: Vec<LocationRow>,
}

impl RawTables {
    /// Write all four tables as CSV
    pub fn write(&self, sources: &DataSources) -> Result<(), DataError> {
        write_file(&sources.rainfall, "rainfall", &self.rainfall)?;
        write_file(&sources.river_levels, "river_levels", &self.river_levels)?;
        write_file(&sources.flood_records, "flood_records", &self.flood_records)?;
        write_file(&sources.locations, "locations", &self.locations)?;
        Ok(())
    }

    /// Join the tables into one record per (date, city).
    ///
    /// Rainfall and river levels are inner-joined on (date, city), flood
    /// records are left-joined (absent means not flooded) and locations are
    /// inner-joined on city. Output follows the rainfall table's row order.
    pub fn merge(&self) -> Result<Vec<MergedRecord>, DataError> {
        let mut river: HashMap<(NaiveDate, &str), Vec<f64>> = HashMap::new();
        for row in &self.river_levels {
            let date = parse_date(&row.date, &row.city, "river_levels")?;
            river.entry((date, row.city.as_str())).or_default().push(row.river_level);
        }

        let mut labels: HashMap<(NaiveDate, &str), Vec<FloodLabel>> = HashMap::new();
        for row in &self.flood_records {
            let date = parse_date(&row.date, &row.city, "flood_records")?;
            labels.entry((date, row.city.as_str())).or_default().push(label_from_row(row));
        }

        let mut locations: HashMap<&str, Location> = HashMap::new();
        for row in &self.locations {
            if locations.contains_key(row.city.as_str()) {
                warn!("Duplicate location entry for {}, keeping the first", row.city);
                continue;
            }
            locations.insert(
                row.city.as_str(),
                Location {
                    state: row.state.clone(),
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
            );
        }

        let unlabeled = [FloodLabel::default()];
        let mut merged = Vec::with_capacity(self.rainfall.len());
        let mut dropped = 0usize;

        for row in &self.rainfall {
            let date = parse_date(&row.date, &row.city, "rainfall")?;
            let key = (date, row.city.as_str());

            let (Some(levels), Some(location)) = (river.get(&key), locations.get(row.city.as_str())) else {
                dropped += 1;
                continue;
            };

            let row_labels = labels.get(&key).map(Vec::as_slice).unwrap_or(&unlabeled);

            for &river_level in levels {
                for label in row_labels {
                    merged.push(MergedRecord {
                        observation: Observation::new(date, row.city.clone(), row.rainfall, river_level),
                        label: *label,
                        location: location.clone(),
                    });
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} rainfall rows without a river level or location", dropped);
        }
        info!("Merged {} records", merged.len());
        Ok(merged)
    }
}

/// Deserialize every row of a CSV stream with a header line
pub fn read_rows<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect()
}

fn read_file<T: DeserializeOwned>(path: &Path, table: &'static str) -> Result<Vec<T>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(file).map_err(|source| DataError::Csv { table, source })
}

fn write_file<T: Serialize>(path: &Path, table: &'static str, rows: &[T]) -> Result<(), DataError> {
    let file = File::create(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|source| DataError::Csv { table, source })?;
    }
    writer.flush().map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn parse_date(value: &str, city: &str, table: &'static str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DataError::InvalidDate {
        table,
        city: city.to_string(),
        value: value.to_string(),
    })
}

fn label_from_row(row: &FloodRecordRow) -> FloodLabel {
    let severity = row
        .severity
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| match s.parse::<FloodSeverity>() {
            Ok(severity) => Some(severity),
            Err(e) => {
                debug!("Ignoring severity for {} on {}: {}", row.city, row.date, e);
                None
            }
        });

    FloodLabel {
        flood_occurred: row.flood_occurred != 0,
        severity,
    }
}
