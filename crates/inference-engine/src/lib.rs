//! Flood Risk Inference
//!
//! Runs exported random forest and LSTM models against engineered feature
//! vectors, falling back to rule-based estimates when a model is missing.

mod engine;
mod evaluation;
mod forest;
mod lstm;

pub use engine::{ModelPaths, Prediction, PredictionSource, RiskEngine};
pub use evaluation::{
    evaluate_classifier, evaluate_sequence_model, train_test_split, ClassificationReport,
    ClassifierEvaluation, SequenceEvaluation, SplitConfig,
};
pub use forest::{DecisionTree, RandomForestModel};
pub use lstm::{Activation, LstmModel};

use feature_engine::FeatureVector;
use std::path::PathBuf;
use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
}

impl From<serde_json::Error> for InferenceError {
    fn from(err: serde_json::Error) -> Self {
        InferenceError::ModelLoadError(err.to_string())
    }
}

/// Classifier producing a flood probability for a single day
pub trait ProbabilityModel: Send + Sync {
    /// Probability of the flooded class
    fn predict_proba(&self, features: &FeatureVector) -> f64;
}

/// Model forecasting flood probability from a window of days
pub trait SequenceModel: Send + Sync {
    /// Probability that the day after the window floods
    fn forecast(&self, sequence: &[FeatureVector]) -> Result<f64, InferenceError>;
}
