//! Random Forest Inference
//!
//! Trees are exported from a trained sklearn `RandomForestClassifier` as
//! parallel node arrays; this module only evaluates them.

use crate::{InferenceError, ProbabilityModel};
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Child index marking a leaf
const LEAF: i32 = -1;

/// One exported tree, nodes in sklearn order (children after parents)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Split feature per node (ignored for leaves)
    pub feature: Vec<i32>,
    /// Split threshold per node; `x <= threshold` goes left
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    /// Class counts (or fractions) per node
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.feature.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        if self.threshold.len() != n || self.left.len() != n || self.right.len() != n || self.value.len() != n {
            return Err("inconsistent node array lengths".into());
        }

        for idx in 0..n {
            if self.value[idx].len() != n_classes {
                return Err(format!("node {idx} has {} class values", self.value[idx].len()));
            }
            if self.is_leaf(idx) {
                continue;
            }
            let feature = self.feature[idx];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {idx} splits on feature {feature}"));
            }
            for child in [self.left[idx], self.right[idx]] {
                // Children must come after their parent, which also rules out cycles
                if child <= idx as i32 || child as usize >= n {
                    return Err(format!("node {idx} has invalid child {child}"));
                }
            }
        }
        Ok(())
    }

    fn is_leaf(&self, idx: usize) -> bool {
        self.left[idx] == LEAF || self.right[idx] == LEAF
    }

    /// Index of the leaf reached by a sample
    pub fn leaf_for(&self, features: &[f64]) -> usize {
        let mut idx = 0usize;
        while !self.is_leaf(idx) {
            let value = features.get(self.feature[idx] as usize).copied().unwrap_or(0.0);
            idx = if value <= self.threshold[idx] {
                self.left[idx] as usize
            } else {
                self.right[idx] as usize
            };
        }
        idx
    }

    /// Class distribution at the sample's leaf, normalized to sum to 1
    pub fn predict_distribution(&self, features: &[f64]) -> Vec<f64> {
        let counts = &self.value[self.leaf_for(features)];
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / counts.len() as f64; counts.len()]
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.feature.len()
    }
}

/// Binary random forest classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestModel {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForestModel {
    /// Build and validate a forest
    pub fn from_trees(trees: Vec<DecisionTree>) -> Result<Self, InferenceError> {
        let model = Self {
            n_features: FEATURE_DIMENSION,
            n_classes: 2,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load a JSON artifact from disk
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let json = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&json)?;
        info!(
            "Loaded random forest from {}: {} trees, {} nodes",
            path.display(),
            model.n_trees(),
            model.total_nodes()
        );
        Ok(model)
    }

    fn validate(&self) -> Result<(), InferenceError> {
        if self.n_features != FEATURE_DIMENSION {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{FEATURE_DIMENSION} features"),
                actual: format!("{} features", self.n_features),
            });
        }
        if self.n_classes != 2 {
            return Err(InferenceError::InvalidArtifact(format!(
                "binary classifier expected, got {} classes",
                self.n_classes
            )));
        }
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidArtifact("empty forest".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| InferenceError::InvalidArtifact(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

impl ProbabilityModel for RandomForestModel {
    /// Mean of the per-tree leaf probabilities of the flooded class
    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_distribution(features.as_slice())[1])
            .sum();
        total / self.trees.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Splits on `feature <= threshold`: left leaf all dry, right leaf all flooded
    pub(crate) fn stump(feature: i32, threshold: f64) -> DecisionTree {
        DecisionTree {
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            value: vec![vec![50.0, 50.0], vec![40.0, 0.0], vec![0.0, 10.0]],
        }
    }

    fn leaf(dry: f64, flooded: f64) -> DecisionTree {
        DecisionTree {
            feature: vec![-2],
            threshold: vec![-2.0],
            left: vec![-1],
            right: vec![-1],
            value: vec![vec![dry, flooded]],
        }
    }

    #[test]
    fn test_single_stump() {
        // river_level is feature 1
        let forest = RandomForestModel::from_trees(vec![stump(1, 7.0)]).unwrap();
        assert_eq!(forest.predict_proba(&FeatureVector::new(0.0, 3.0, 0.0, 0.0, 0.0)), 0.0);
        assert_eq!(forest.predict_proba(&FeatureVector::new(0.0, 9.0, 0.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_probability_is_tree_mean() {
        let forest = RandomForestModel::from_trees(vec![stump(0, 80.0), stump(1, 7.0), leaf(3.0, 1.0)]).unwrap();
        // Rainfall high, river low: 1.0 + 0.0 + 0.25
        let p = forest.predict_proba(&FeatureVector::new(100.0, 2.0, 0.0, 0.0, 0.0));
        assert!((p - 1.25 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_goes_left() {
        let tree = stump(4, 0.5);
        assert_eq!(tree.leaf_for(&[0.0, 0.0, 0.0, 0.0, 0.5]), 1);
        assert_eq!(tree.leaf_for(&[0.0, 0.0, 0.0, 0.0, 0.51]), 2);
    }

    #[test]
    fn test_json_round_trip_of_artifact() {
        let json = r#"{
            "n_features": 5,
            "n_classes": 2,
            "trees": [{
                "feature": [2, -2, -2],
                "threshold": [120.0, -2.0, -2.0],
                "left": [1, -1, -1],
                "right": [2, -1, -1],
                "value": [[9.0, 1.0], [9.0, 0.0], [1.0, 3.0]]
            }]
        }"#;
        let forest = RandomForestModel::from_json(json).unwrap();
        assert_eq!(forest.n_trees(), 1);
        assert_eq!(forest.predict_proba(&FeatureVector::new(0.0, 0.0, 200.0, 0.0, 0.0)), 0.75);
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let mut forest = RandomForestModel::from_trees(vec![stump(0, 1.0)]).unwrap();
        forest.n_features = 4;
        let json = serde_json::to_string(&forest).unwrap();
        assert!(matches!(
            RandomForestModel::from_json(&json),
            Err(InferenceError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_rejects_backward_child() {
        let mut tree = stump(0, 1.0);
        tree.right[0] = 0;
        assert!(matches!(
            RandomForestModel::from_trees(vec![tree]),
            Err(InferenceError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_feature() {
        assert!(RandomForestModel::from_trees(vec![stump(5, 1.0)]).is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        assert!(RandomForestModel::from_trees(vec![]).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            RandomForestModel::from_json("{not json"),
            Err(InferenceError::ModelLoadError(_))
        ));
    }
}
