//! Storage Layer
//!
//! Owns the on-disk layout of datasets, model artifacts and dashboard
//! outputs, and reads and writes the JSON artifacts.

mod store;

pub use store::{ArtifactStore, ALERTS_FILE, EVALUATION_FILE, SIMULATION_FILE};

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error in {}: {source}", path.display())]
    SerializationError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
}
