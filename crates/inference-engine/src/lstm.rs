//! LSTM Sequence Model Inference
//!
//! Evaluates a stack of LSTM and dense layers exported from Keras. Weights
//! keep the Keras layout: `kernel` is `(input_dim, 4 * units)`,
//! `recurrent_kernel` is `(units, 4 * units)` and gates are ordered
//! input, forget, cell, output. Dropout layers are not exported since they
//! are the identity at inference time.

use crate::{InferenceError, SequenceModel};
use feature_engine::{FeatureVector, FEATURE_DIMENSION};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Layer activation function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    #[default]
    Tanh,
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Linear => x,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Layer as stored in the JSON artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LayerSpec {
    Lstm {
        units: usize,
        #[serde(default)]
        activation: Activation,
        #[serde(default)]
        return_sequences: bool,
        kernel: Vec<Vec<f64>>,
        recurrent_kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
    Dense {
        #[serde(default = "linear")]
        activation: Activation,
        kernel: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
}

fn linear() -> Activation {
    Activation::Linear
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LstmArtifact {
    #[serde(default = "default_input_features")]
    input_features: usize,
    layers: Vec<LayerSpec>,
}

fn default_input_features() -> usize {
    FEATURE_DIMENSION
}

#[derive(Debug, Clone)]
enum Layer {
    Lstm {
        units: usize,
        activation: Activation,
        return_sequences: bool,
        kernel: Array2<f64>,
        recurrent_kernel: Array2<f64>,
        bias: Array1<f64>,
    },
    Dense {
        activation: Activation,
        kernel: Array2<f64>,
        bias: Array1<f64>,
    },
}

impl Layer {
    fn output_dim(&self) -> usize {
        match self {
            Layer::Lstm { units, .. } => *units,
            Layer::Dense { bias, .. } => bias.len(),
        }
    }

    fn forward(&self, inputs: Vec<Array1<f64>>) -> Vec<Array1<f64>> {
        match self {
            Layer::Lstm {
                units,
                activation,
                return_sequences,
                kernel,
                recurrent_kernel,
                bias,
            } => {
                let u = *units;
                let mut h = Array1::<f64>::zeros(u);
                let mut c = Array1::<f64>::zeros(u);
                let mut outputs = Vec::with_capacity(inputs.len());

                for x in &inputs {
                    let z = x.dot(kernel) + h.dot(recurrent_kernel) + bias;
                    let i = z.slice(s![0..u]).mapv(sigmoid);
                    let f = z.slice(s![u..2 * u]).mapv(sigmoid);
                    let g = z.slice(s![2 * u..3 * u]).mapv(|v| activation.apply(v));
                    let o = z.slice(s![3 * u..4 * u]).mapv(sigmoid);

                    c = &f * &c + &i * &g;
                    h = &o * &c.mapv(|v| activation.apply(v));
                    if *return_sequences {
                        outputs.push(h.clone());
                    }
                }

                if *return_sequences {
                    outputs
                } else {
                    vec![h]
                }
            }
            Layer::Dense {
                activation,
                kernel,
                bias,
            } => inputs
                .into_iter()
                .map(|x| (x.dot(kernel) + bias).mapv(|v| activation.apply(v)))
                .collect(),
        }
    }
}

/// Stacked LSTM flood forecaster
#[derive(Debug, Clone)]
pub struct LstmModel {
    input_features: usize,
    layers: Vec<Layer>,
}

impl LstmModel {
    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let artifact: LstmArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Load a JSON artifact from disk
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let json = std::fs::read_to_string(path).map_err(|source| InferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_json(&json)?;
        info!("Loaded LSTM from {}: {} layers", path.display(), model.layers.len());
        Ok(model)
    }

    fn from_artifact(artifact: LstmArtifact) -> Result<Self, InferenceError> {
        if artifact.input_features != FEATURE_DIMENSION {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("{FEATURE_DIMENSION} features"),
                actual: format!("{} features", artifact.input_features),
            });
        }
        if artifact.layers.is_empty() {
            return Err(InferenceError::InvalidArtifact("model has no layers".into()));
        }

        let mut input_dim = artifact.input_features;
        let mut layers = Vec::with_capacity(artifact.layers.len());
        for (index, spec) in artifact.layers.into_iter().enumerate() {
            let layer = build_layer(spec, input_dim)
                .map_err(|e| InferenceError::InvalidArtifact(format!("layer {index}: {e}")))?;
            input_dim = layer.output_dim();
            layers.push(layer);
        }

        if input_dim != 1 {
            return Err(InferenceError::InvalidArtifact(format!(
                "final layer must have 1 output, has {input_dim}"
            )));
        }

        Ok(Self {
            input_features: FEATURE_DIMENSION,
            layers,
        })
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }
}

impl SequenceModel for LstmModel {
    fn forecast(&self, sequence: &[FeatureVector]) -> Result<f64, InferenceError> {
        if sequence.is_empty() {
            return Err(InferenceError::InvalidInputShape {
                expected: format!("(timesteps >= 1, {})", self.input_features),
                actual: "(0, 0)".to_string(),
            });
        }

        let mut activations: Vec<Array1<f64>> = sequence
            .iter()
            .map(|v| Array1::from_vec(v.values.to_vec()))
            .collect();
        for layer in &self.layers {
            activations = layer.forward(activations);
        }

        let output = activations
            .last()
            .and_then(|a| a.get(0).copied())
            .ok_or_else(|| InferenceError::InvalidArtifact("model produced no output".into()))?;
        if !output.is_finite() {
            return Err(InferenceError::InvalidArtifact(format!(
                "model produced a non-finite output ({output})"
            )));
        }
        // Heads without a sigmoid may leave the probability range
        Ok(output.clamp(0.0, 1.0))
    }
}

fn build_layer(spec: LayerSpec, input_dim: usize) -> Result<Layer, String> {
    match spec {
        LayerSpec::Lstm {
            units,
            activation,
            return_sequences,
            kernel,
            recurrent_kernel,
            bias,
        } => {
            if units == 0 {
                return Err("LSTM with 0 units".into());
            }
            let kernel = matrix(kernel, input_dim, 4 * units, "kernel")?;
            let recurrent_kernel = matrix(recurrent_kernel, units, 4 * units, "recurrent_kernel")?;
            if bias.len() != 4 * units {
                return Err(format!("bias has {} values, expected {}", bias.len(), 4 * units));
            }
            Ok(Layer::Lstm {
                units,
                activation,
                return_sequences,
                kernel,
                recurrent_kernel,
                bias: Array1::from_vec(bias),
            })
        }
        LayerSpec::Dense {
            activation,
            kernel,
            bias,
        } => {
            let kernel = matrix(kernel, input_dim, bias.len(), "kernel")?;
            Ok(Layer::Dense {
                activation,
                kernel,
                bias: Array1::from_vec(bias),
            })
        }
    }
}

fn matrix(rows: Vec<Vec<f64>>, n_rows: usize, n_cols: usize, name: &str) -> Result<Array2<f64>, String> {
    if rows.len() != n_rows || rows.iter().any(|r| r.len() != n_cols) {
        return Err(format!("{name} must be {n_rows}x{n_cols}"));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| format!("{name}: {e}"))
}
