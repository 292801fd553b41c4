//! Sequence Windows for the LSTM Model

use crate::features::{FeatureRow, FeatureVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Days of history per LSTM input sequence
pub const DEFAULT_TIMESTEPS: usize = 7;

/// Sequences and their next-day flood labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceSet {
    pub sequences: Vec<Vec<FeatureVector>>,
    pub labels: Vec<bool>,
    pub timesteps: usize,
}

impl SequenceSet {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Build sliding windows of `timesteps` rows per city.
///
/// Each window is labeled with the flood outcome of the row that follows it,
/// so a city with `n` rows yields `n - timesteps` sequences. Rows must be
/// grouped by city and sorted by date, as returned by the feature engineer.
pub fn create_sequences(rows: &[FeatureRow], timesteps: usize) -> SequenceSet {
    let mut set = SequenceSet {
        timesteps,
        ..Default::default()
    };
    if timesteps == 0 {
        return set;
    }

    for city_rows in rows.chunk_by(|a, b| a.observation.city == b.observation.city) {
        if city_rows.len() <= timesteps {
            debug!(
                "Skipping {}: {} rows is not enough for {} timesteps",
                city_rows[0].observation.city,
                city_rows.len(),
                timesteps
            );
            continue;
        }

        for i in 0..city_rows.len() - timesteps {
            set.sequences
                .push(city_rows[i..i + timesteps].iter().map(FeatureRow::vector).collect());
            set.labels.push(city_rows[i + timesteps].label.flood_occurred);
        }
    }

    set
}
