//! Fallback Policies

use feature_engine::{flood_score, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Probability reported when nothing better is known
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// How to estimate a probability without a model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Always report [`NEUTRAL_PROBABILITY`]
    #[default]
    Neutral,
    /// Use the heuristic flood score of the feature vector
    FloodScore,
}

/// Estimates flood probability from features alone
#[derive(Debug, Clone, Default)]
pub struct FallbackEngine {
    policy: FallbackPolicy,
}

impl FallbackEngine {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Estimate for a single feature vector
    pub fn estimate(&self, features: &FeatureVector) -> f64 {
        match self.policy {
            FallbackPolicy::Neutral => NEUTRAL_PROBABILITY,
            FallbackPolicy::FloodScore => {
                let score = flood_score(features.rainfall_3day(), features.river_level(), features.river_rise());
                debug!("Fallback flood score: {:.3}", score);
                score
            }
        }
    }

    /// Estimate for a sequence, using its most recent day
    pub fn estimate_sequence(&self, sequence: &[FeatureVector]) -> f64 {
        match sequence.last() {
            Some(latest) => self.estimate(latest),
            None => NEUTRAL_PROBABILITY,
        }
    }
}
