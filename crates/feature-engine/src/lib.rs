//! Feature Engineering Engine
//!
//! Derives rolling rainfall sums, river rise and the heuristic flood score
//! from per-city observation series, and assembles the fixed-order feature
//! vectors and LSTM sequences consumed by the models.

mod features;
mod sequences;
mod window;

pub use features::{
    flood_score, DatasetSummary, FeatureEngineer, FeatureRow, FeatureVector, FEATURE_DIMENSION,
    FEATURE_NAMES, LONG_WINDOW, SHORT_WINDOW,
};
pub use sequences::{create_sequences, SequenceSet, DEFAULT_TIMESTEPS};
pub use window::{first_difference, rolling_sum, RollingSum};
