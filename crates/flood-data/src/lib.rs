//! Flood Data Ingestion
//!
//! Loads the raw rainfall, river level, flood record and location tables,
//! sanitizes their numeric columns and merges them into one observation table.

mod error;
mod generator;
mod ingest;
mod records;

pub use error::DataError;
pub use generator::{generate, round_to, sample_normal, GeneratorConfig, CITIES};
pub use ingest::{read_rows, DataSources, RawTables};
pub use records::{
    FloodLabel, FloodRecordRow, FloodSeverity, Location, LocationRow, MergedRecord, Observation,
    RainfallRow, RiverLevelRow, DATE_FORMAT,
};
