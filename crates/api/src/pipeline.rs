//! Batch Pipeline
//!
//! Setup, dataset generation, feature preparation, model evaluation and the
//! simulation run, each as a step over owned data.

use crate::config::AppConfig;
use crate::simulation::{run_simulation, SimulationFrame, SimulationOutput};
use alerting::Alert;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fallback::FallbackEngine;
use feature_engine::{
    create_sequences, DatasetSummary, FeatureEngineer, FeatureRow, DEFAULT_TIMESTEPS, FEATURE_NAMES,
};
use flood_data::{generate, DataSources};
use inference_engine::{
    evaluate_classifier, evaluate_sequence_model, ClassifierEvaluation, ModelPaths, RiskEngine,
    SequenceEvaluation,
};
use serde::{Deserialize, Serialize};
use storage::ArtifactStore;
use tracing::{info, warn};

/// Evaluation report persisted next to the model artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub random_forest: Option<ClassifierEvaluation>,
    pub lstm: Option<SequenceEvaluation>,
    pub dataset: DatasetSummary,
    pub features: Vec<String>,
    pub cities_monitored: usize,
    pub last_updated: DateTime<Utc>,
}

/// Counts from a full run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub samples: usize,
    pub frames: usize,
    pub alerts: usize,
    pub evaluated: bool,
}

/// Pipeline steps bound to one configuration
pub struct Pipeline {
    config: AppConfig,
    store: ArtifactStore,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        let store = ArtifactStore::new(&config.paths.root);
        Self { config, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn sources(&self) -> DataSources {
        DataSources::in_dir(self.store.data_dir())
    }

    /// Write synthetic datasets. Returns false when they already exist and
    /// `force` is not set.
    pub fn generate_datasets(&self, force: bool) -> Result<bool> {
        if self.store.has_datasets() && !force {
            info!("✓ Data files found");
            return Ok(false);
        }

        self.store.setup_directories()?;
        info!("📊 Generating sample datasets...");
        generate(&self.config.generator)
            .write(&self.sources())
            .context("failed to write generated datasets")?;
        Ok(true)
    }

    /// Load, merge and engineer the datasets
    pub fn prepare_training_data(&self) -> Result<Vec<FeatureRow>> {
        let merged = self
            .sources()
            .load()
            .and_then(|tables| tables.merge())
            .context("failed to load datasets")?;
        let rows = FeatureEngineer::new().engineer(merged);

        let summary = DatasetSummary::from_rows(&rows);
        info!(
            "Prepared {} samples, {} flood events, {} cities",
            summary.samples, summary.flood_events, summary.cities
        );
        Ok(rows)
    }

    /// Load whichever model artifacts exist
    pub fn load_engine(&self) -> Result<RiskEngine> {
        let paths = ModelPaths::in_dir(self.store.models_dir());
        let fallback = FallbackEngine::new(self.config.models.fallback_policy);
        RiskEngine::load(&paths, fallback).context("failed to load model artifacts")
    }

    /// Score the loaded models on the held-out split and persist the report
    pub fn evaluate(&self, engine: &RiskEngine, rows: &[FeatureRow]) -> Result<ModelStats> {
        let split = &self.config.models.split;
        let random_forest = engine.classifier().map(|model| evaluate_classifier(model, rows, split));
        let lstm = engine.sequence_model().map(|model| {
            let sequences = create_sequences(rows, DEFAULT_TIMESTEPS);
            evaluate_sequence_model(model, &sequences, split)
        });

        let dataset = DatasetSummary::from_rows(rows);
        let stats = ModelStats {
            random_forest,
            lstm,
            dataset,
            features: FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
            cities_monitored: dataset.cities,
            last_updated: Utc::now(),
        };

        self.store.write_json(&self.store.evaluation_path(), &stats)?;
        info!("✓ Evaluation saved to {}", self.store.evaluation_path().display());
        Ok(stats)
    }

    /// Run the simulation and persist the frames and the alert feed
    pub fn simulate(&self, engine: &RiskEngine) -> Result<SimulationOutput> {
        info!("🗺️ Generating flood risk simulation...");
        let output = run_simulation(&self.config.simulation, engine, self.config.alerts.feed.clone());

        self.store.write_json(&self.store.simulation_path(), &output.frames)?;
        self.store.write_alerts(output.feed.records())?;
        Ok(output)
    }

    /// Every step in order
    pub fn run(&self) -> Result<RunSummary> {
        info!("{}", "=".repeat(60));
        info!("🌧️  SURAKSHA AI - Flood Risk Prediction System");
        info!("{}", "=".repeat(60));

        self.store.setup_directories()?;
        info!("✓ Directories ready");
        self.generate_datasets(false)?;

        let rows = self.prepare_training_data()?;
        let engine = self.load_engine()?;

        let evaluated = if engine.has_classifier() || engine.has_sequence_model() {
            self.evaluate(&engine, &rows)?;
            true
        } else {
            warn!(
                "No model artifacts in {}, predictions use the fallback",
                self.store.models_dir().display()
            );
            false
        };

        let output = self.simulate(&engine)?;
        for record in output.feed.latest_per_city() {
            let alert = Alert::from_record(record, self.config.alerts.language);
            info!("[t={}] {}", record.timestep, alert.message);
        }

        Ok(RunSummary {
            samples: rows.len(),
            frames: output.frames.len(),
            alerts: output.feed.len(),
            evaluated,
        })
    }

    /// Simulation frames written by the last run
    pub fn read_frames(&self) -> Result<Vec<SimulationFrame>> {
        Ok(self.store.read_json(&self.store.simulation_path())?)
    }
}
