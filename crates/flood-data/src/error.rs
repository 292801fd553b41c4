//! Ingestion Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading or writing the raw tables
#[derive(Debug, Error)]
pub enum DataError {
    /// Input or output file could not be opened
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table is not valid CSV
    #[error("malformed CSV in {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Date column could not be parsed as YYYY-MM-DD
    #[error("invalid date '{value}' for city '{city}' in {table} table")]
    InvalidDate {
        table: &'static str,
        city: String,
        value: String,
    },
}
