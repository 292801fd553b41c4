//! Held-out Evaluation
//!
//! Splits the engineered dataset the same way on every run and scores the
//! loaded models against the test portion.

use crate::{ProbabilityModel, SequenceModel};
use feature_engine::{FeatureRow, SequenceSet};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Train/test split settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for testing
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Shuffle indices with a seeded RNG and split off `ceil(n * test_fraction)` test samples
pub fn train_test_split<T: Clone>(items: &[T], config: &SplitConfig) -> (Vec<T>, Vec<T>) {
    let n = items.len();
    let n_test = ((n as f64) * config.test_fraction.clamp(0.0, 1.0)).ceil() as usize;

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].iter().map(|&i| items[i].clone()).collect();
    let train = indices[n_test..].iter().map(|&i| items[i].clone()).collect();
    (train, test)
}

/// Binary classification metrics for the flooded class
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ClassificationReport {
    /// Metrics from paired labels. Undefined ratios are reported as 0.
    pub fn from_predictions(actual: &[bool], predicted: &[bool]) -> Self {
        let mut report = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (true, true) => report.true_positive += 1,
                (false, true) => report.false_positive += 1,
                (false, false) => report.true_negative += 1,
                (true, false) => report.false_negative += 1,
            }
        }

        let tp = report.true_positive as f64;
        let total = report.support() as f64;
        report.accuracy = ratio(tp + report.true_negative as f64, total);
        report.precision = ratio(tp, tp + report.false_positive as f64);
        report.recall = ratio(tp, tp + report.false_negative as f64);
        report.f1_score = ratio(2.0 * report.precision * report.recall, report.precision + report.recall);
        report
    }

    /// Number of evaluated samples
    pub fn support(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Random forest scores on the held-out split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierEvaluation {
    pub train_samples: usize,
    pub test_samples: usize,
    pub report: ClassificationReport,
}

/// Score a classifier on the test split; probabilities above 0.5 count as flooded
pub fn evaluate_classifier(
    model: &dyn ProbabilityModel,
    rows: &[FeatureRow],
    config: &SplitConfig,
) -> ClassifierEvaluation {
    let (train, test) = train_test_split(rows, config);
    let actual: Vec<bool> = test.iter().map(|r| r.label.flood_occurred).collect();
    let predicted: Vec<bool> = test
        .iter()
        .map(|r| model.predict_proba(&r.vector()) > 0.5)
        .collect();

    let report = ClassificationReport::from_predictions(&actual, &predicted);
    info!(
        "Random forest: accuracy={:.3} precision={:.3} recall={:.3} f1={:.3} (test={})",
        report.accuracy,
        report.precision,
        report.recall,
        report.f1_score,
        test.len()
    );

    ClassifierEvaluation {
        train_samples: train.len(),
        test_samples: test.len(),
        report,
    }
}

/// LSTM scores on the held-out split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceEvaluation {
    pub train_samples: usize,
    pub test_samples: usize,
    /// Mean binary cross-entropy
    pub loss: f64,
    pub accuracy: f64,
}

/// Score a sequence model on the test split of a sequence set
pub fn evaluate_sequence_model(
    model: &dyn SequenceModel,
    set: &SequenceSet,
    config: &SplitConfig,
) -> SequenceEvaluation {
    let pairs: Vec<usize> = (0..set.len()).collect();
    let (train, test) = train_test_split(&pairs, config);

    let mut loss = 0.0;
    let mut correct = 0usize;
    let mut scored = 0usize;
    for &i in &test {
        let label = set.labels[i];
        let p = match model.forecast(&set.sequences[i]) {
            Ok(p) => p.clamp(1e-7, 1.0 - 1e-7),
            Err(e) => {
                warn!("Skipping sequence {}: {}", i, e);
                continue;
            }
        };
        loss -= if label { p.ln() } else { (1.0 - p).ln() };
        if (p > 0.5) == label {
            correct += 1;
        }
        scored += 1;
    }

    let evaluation = SequenceEvaluation {
        train_samples: train.len(),
        test_samples: scored,
        loss: ratio(loss, scored as f64),
        accuracy: ratio(correct as f64, scored as f64),
    };
    info!(
        "LSTM: loss={:.4} accuracy={:.4} (test={})",
        evaluation.loss, evaluation.accuracy, evaluation.test_samples
    );
    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{tests::stump, RandomForestModel};
    use chrono::{Duration, NaiveDate};
    use feature_engine::{FeatureEngineer, FeatureVector};
    use flood_data::Observation;

    #[test]
    fn test_split_sizes() {
        let items: Vec<u32> = (0..10).collect();
        let (train, test) = train_test_split(&items, &SplitConfig::default());
        assert_eq!(test.len(), 2);
        assert_eq!(train.len(), 8);

        let mut all: Vec<u32> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, items);
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let items: Vec<u32> = (0..11).collect();
        let (train, test) = train_test_split(&items, &SplitConfig::default());
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_deterministic() {
        let items: Vec<u32> = (0..100).collect();
        let config = SplitConfig::default();
        assert_eq!(train_test_split(&items, &config), train_test_split(&items, &config));

        let other = SplitConfig { seed: 7, ..config };
        assert_ne!(train_test_split(&items, &config).1, train_test_split(&items, &other).1);
    }

    #[test]
    fn test_report_metrics() {
        let actual = [true, true, false, false, true];
        let predicted = [true, false, false, true, true];
        let report = ClassificationReport::from_predictions(&actual, &predicted);

        assert_eq!(report.true_positive, 2);
        assert_eq!(report.false_positive, 1);
        assert_eq!(report.true_negative, 1);
        assert_eq!(report.false_negative, 1);
        assert!((report.accuracy - 0.6).abs() < 1e-12);
        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.f1_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_without_positives() {
        let report = ClassificationReport::from_predictions(&[false, false], &[false, false]);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1_score, 0.0);
    }

    #[test]
    fn test_evaluate_perfect_classifier() {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let observations: Vec<Observation> = (0..50)
            .map(|i| Observation::new(start + Duration::days(i), "Patna", 0.0, if i % 5 == 0 { 9.0 } else { 2.0 }))
            .collect();
        let mut rows = FeatureEngineer::new().engineer_observations(observations);
        for row in &mut rows {
            row.label.flood_occurred = row.observation.river_level_m > 7.0;
        }

        let forest = RandomForestModel::from_trees(vec![stump(1, 7.0)]).unwrap();
        let evaluation = evaluate_classifier(&forest, &rows, &SplitConfig::default());

        assert_eq!(evaluation.test_samples, 10);
        assert_eq!(evaluation.train_samples, 40);
        assert_eq!(evaluation.report.accuracy, 1.0);
    }

    struct Constant(f64);

    impl SequenceModel for Constant {
        fn forecast(&self, _sequence: &[FeatureVector]) -> Result<f64, crate::InferenceError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_sequence_loss() {
        let set = SequenceSet {
            sequences: vec![vec![FeatureVector::default(); 7]; 10],
            labels: vec![false; 10],
            timesteps: 7,
        };
        let evaluation = evaluate_sequence_model(&Constant(0.1), &set, &SplitConfig::default());

        assert_eq!(evaluation.test_samples, 2);
        assert_eq!(evaluation.accuracy, 1.0);
        assert!((evaluation.loss - (-(0.9f64).ln())).abs() < 1e-9);
    }
}
