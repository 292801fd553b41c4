//! Artifact Store Implementation

use crate::StorageError;
use alerting::AlertRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Alert feed, under `visualization/`
pub const ALERTS_FILE: &str = "alerts.json";
/// Simulation frames, under `visualization/`
pub const SIMULATION_FILE: &str = "simulation.json";
/// Evaluation report, under `models/`
pub const EVALUATION_FILE: &str = "evaluation.json";

const LOCATIONS_FILE: &str = "locations.csv";
const FOREST_FILE: &str = "rf_model.json";

/// Filesystem layout rooted at a working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    pub fn visualization_dir(&self) -> PathBuf {
        self.root.join("visualization")
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.visualization_dir().join(ALERTS_FILE)
    }

    pub fn simulation_path(&self) -> PathBuf {
        self.visualization_dir().join(SIMULATION_FILE)
    }

    pub fn evaluation_path(&self) -> PathBuf {
        self.models_dir().join(EVALUATION_FILE)
    }

    /// Create `data/`, `models/` and `visualization/` if missing
    pub fn setup_directories(&self) -> Result<(), StorageError> {
        for dir in [self.data_dir(), self.models_dir(), self.visualization_dir()] {
            fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        info!("Directory layout ready under {}", self.root.display());
        Ok(())
    }

    /// Datasets are considered present once the locations table exists
    pub fn has_datasets(&self) -> bool {
        self.data_dir().join(LOCATIONS_FILE).exists()
    }

    pub fn has_models(&self) -> bool {
        self.models_dir().join(FOREST_FILE).exists()
    }

    /// Serialize `value` as pretty JSON, creating parent directories
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::SerializationError {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Wrote {}", path.display());
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StorageError> {
        if !path.exists() {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::SerializationError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_alerts(&self, alerts: &[AlertRecord]) -> Result<(), StorageError> {
        self.write_json(&self.alerts_path(), alerts)?;
        info!("Saved {} alerts to {}", alerts.len(), self.alerts_path().display());
        Ok(())
    }

    /// Alert feed; empty when no feed has been written yet
    pub fn read_alerts(&self) -> Result<Vec<AlertRecord>, StorageError> {
        match self.read_json(&self.alerts_path()) {
            Err(StorageError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::RiskLevel;
    use serde::Deserialize;

    #[test]
    fn test_setup_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.setup_directories().unwrap();
        // Idempotent
        store.setup_directories().unwrap();

        assert!(store.data_dir().is_dir());
        assert!(store.models_dir().is_dir());
        assert!(store.visualization_dir().is_dir());
        assert!(!store.has_datasets());
        assert!(!store.has_models());
    }

    #[test]
    fn test_presence_checks() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.setup_directories().unwrap();

        fs::write(store.data_dir().join("locations.csv"), "city,state,latitude,longitude\n").unwrap();
        fs::write(store.models_dir().join("rf_model.json"), "{}").unwrap();

        assert!(store.has_datasets());
        assert!(store.has_models());
    }

    #[test]
    fn test_alerts_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.read_alerts().unwrap().is_empty());

        let alerts = vec![AlertRecord {
            timestep: 5,
            city: "Guwahati".to_string(),
            risk_level: RiskLevel::Severe,
            probability: 0.91,
            rainfall: 120.5,
            river_level: 9.4,
        }];
        store.write_alerts(&alerts).unwrap();

        assert!(store.alerts_path().exists());
        assert_eq!(store.read_alerts().unwrap(), alerts);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        accuracy: f64,
    }

    #[test]
    fn test_missing_and_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let missing = store.read_json::<Stats>(&store.evaluation_path());
        assert!(matches!(missing, Err(StorageError::NotFound(_))));

        store.setup_directories().unwrap();
        fs::write(store.evaluation_path(), "not json").unwrap();
        let corrupt = store.read_json::<Stats>(&store.evaluation_path());
        assert!(matches!(corrupt, Err(StorageError::SerializationError { .. })));

        store.write_json(&store.evaluation_path(), &Stats { accuracy: 0.93 }).unwrap();
        assert_eq!(store.read_json::<Stats>(&store.evaluation_path()).unwrap(), Stats { accuracy: 0.93 });
    }
}
