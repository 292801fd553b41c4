//! Risk Engine

use crate::forest::RandomForestModel;
use crate::lstm::LstmModel;
use crate::{InferenceError, ProbabilityModel, SequenceModel};
use fallback::FallbackEngine;
use feature_engine::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where the exported model artifacts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPaths {
    pub random_forest: PathBuf,
    pub lstm: PathBuf,
}

impl ModelPaths {
    /// Standard artifact names inside a models directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            random_forest: dir.join("rf_model.json"),
            lstm: dir.join("lstm_model.json"),
        }
    }
}

/// Which model produced a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    RandomForest,
    Lstm,
    Fallback,
    /// Synthetic risk curve, used by the simulation when no classifier is loaded
    Simulated,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionSource::RandomForest => "random_forest",
            PredictionSource::Lstm => "lstm",
            PredictionSource::Fallback => "fallback",
            PredictionSource::Simulated => "simulated",
        }
    }
}

impl fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flood probability and where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probability: f64,
    pub source: PredictionSource,
}

/// Serves flood probabilities from whichever models are available
pub struct RiskEngine {
    classifier: Option<Box<dyn ProbabilityModel>>,
    sequence_model: Option<Box<dyn SequenceModel>>,
    fallback: FallbackEngine,
}

impl RiskEngine {
    /// Engine with no models; every prediction comes from the fallback
    pub fn new(fallback: FallbackEngine) -> Self {
        Self {
            classifier: None,
            sequence_model: None,
            fallback,
        }
    }

    pub fn with_classifier(mut self, model: Box<dyn ProbabilityModel>) -> Self {
        self.classifier = Some(model);
        self
    }

    pub fn with_sequence_model(mut self, model: Box<dyn SequenceModel>) -> Self {
        self.sequence_model = Some(model);
        self
    }

    /// Load whichever artifacts exist.
    ///
    /// A missing artifact leaves that model unset. An artifact that exists
    /// but cannot be parsed is an error.
    pub fn load(paths: &ModelPaths, fallback: FallbackEngine) -> Result<Self, InferenceError> {
        let mut engine = Self::new(fallback);

        if paths.random_forest.exists() {
            engine.classifier = Some(Box::new(RandomForestModel::load(&paths.random_forest)?));
        } else {
            warn!(
                "Random forest not found at {}, using {:?} fallback",
                paths.random_forest.display(),
                engine.fallback.policy()
            );
        }

        if paths.lstm.exists() {
            engine.sequence_model = Some(Box::new(LstmModel::load(&paths.lstm)?));
        } else {
            warn!(
                "LSTM not found at {}, using {:?} fallback",
                paths.lstm.display(),
                engine.fallback.policy()
            );
        }

        info!(
            "Risk engine ready: classifier={}, sequence_model={}",
            engine.has_classifier(),
            engine.has_sequence_model()
        );
        Ok(engine)
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn has_sequence_model(&self) -> bool {
        self.sequence_model.is_some()
    }

    pub fn classifier(&self) -> Option<&dyn ProbabilityModel> {
        self.classifier.as_deref()
    }

    pub fn sequence_model(&self) -> Option<&dyn SequenceModel> {
        self.sequence_model.as_deref()
    }

    /// Flood probability for a single day
    pub fn predict_risk(&self, features: &FeatureVector) -> Prediction {
        match &self.classifier {
            Some(model) => Prediction {
                probability: model.predict_proba(features),
                source: PredictionSource::RandomForest,
            },
            None => Prediction {
                probability: self.fallback.estimate(features),
                source: PredictionSource::Fallback,
            },
        }
    }

    /// Flood probability for the day after a window
    pub fn forecast_timeseries(&self, sequence: &[FeatureVector]) -> Prediction {
        if let Some(model) = &self.sequence_model {
            match model.forecast(sequence) {
                Ok(probability) => {
                    return Prediction {
                        probability,
                        source: PredictionSource::Lstm,
                    }
                }
                Err(e) => warn!("Sequence forecast failed, using fallback: {}", e),
            }
        }

        debug!("Fallback forecast over {} days", sequence.len());
        Prediction {
            probability: self.fallback.estimate_sequence(sequence),
            source: PredictionSource::Fallback,
        }
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(FallbackEngine::default())
    }
}
