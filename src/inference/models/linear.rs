use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::ops::{sigmoid, softmax_last_dim};
use candle_nn::{Linear, Module};
use serde::Deserialize;
use serde_json::Value;

use crate::inference::models::model::ModelBase;
use crate::inference::prediction::Prediction;
use crate::inference::task::predict::PredictHandler;

/// Layout of the weights file.
#[derive(Deserialize, Debug)]
pub struct LinearWeights {
    /// One row per output, one column per input feature
    pub weights: Vec<Vec<f32>>,
    #[serde(default)]
    pub bias: Option<Vec<f32>>,
    #[serde(default)]
    pub activation: Activation,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Sigmoid,
    Softmax,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Features {
    Single(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

/// A single dense layer followed by an optional activation.
#[derive(Clone, Debug)]
pub struct LinearModel {
    pub base: ModelBase,
    layer: Linear,
    activation: Activation,
    in_features: usize,
    device: Device,
}

impl LinearModel {
    #[tracing::instrument(level = "info", skip(base))]
    pub fn from_file(base: &ModelBase, path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref();
        let str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read weights file {}", path.display()))?;
        let weights: LinearWeights = serde_json::from_str(&str)
            .with_context(|| format!("Invalid weights file {}", path.display()))?;
        Self::new(base, weights)
    }

    pub fn new(base: &ModelBase, weights: LinearWeights) -> Result<Self> {
        let device = Device::Cpu;
        let out_features = weights.weights.len();
        if out_features == 0 {
            bail!("Weights must have at least one output row");
        }
        let (in_features, flat) = flatten_rows(weights.weights)?;
        if in_features == 0 {
            bail!("Weights must have at least one input column");
        }
        let weight = Tensor::from_vec(flat, (out_features, in_features), &device)?;

        let bias = match weights.bias {
            Some(bias) if bias.len() != out_features => bail!(
                "Bias has {} entries but weights have {} output rows",
                bias.len(),
                out_features
            ),
            Some(bias) => Some(Tensor::from_vec(bias, out_features, &device)?),
            None => None,
        };

        Ok(Self {
            base: base.clone(),
            layer: Linear::new(weight, bias),
            activation: weights.activation,
            in_features,
            device,
        })
    }

    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = self.layer.forward(xs)?;
        let ys = match self.activation {
            Activation::Identity => ys,
            Activation::Relu => ys.relu()?,
            Activation::Sigmoid => sigmoid(&ys)?,
            Activation::Softmax => softmax_last_dim(&ys)?,
        };
        Ok(ys)
    }

    fn features_to_tensor(&self, features: Features) -> Result<(Tensor, bool)> {
        let (rows, single) = match features {
            Features::Single(row) => (vec![row], true),
            Features::Batch(rows) => (rows, false),
        };
        let batch_size = rows.len();
        if batch_size == 0 {
            bail!("Input batch is empty");
        }
        let (width, flat) = flatten_rows(rows)?;
        if width != self.in_features {
            bail!(
                "Expected {} features per sample, got {}",
                self.in_features,
                width
            );
        }
        // Values beyond the f32 range deserialize to infinity
        if let Some(position) = flat.iter().position(|value| !value.is_finite()) {
            bail!(
                "Feature {} of sample {} is out of range",
                position % width,
                position / width
            );
        }
        let xs = Tensor::from_vec(flat, (batch_size, width), &self.device)?;
        Ok((xs, single))
    }
}

impl PredictHandler for LinearModel {
    fn name(&self) -> &str {
        &self.base.name
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    fn run_predict(&self, input: &Value) -> Result<Prediction> {
        let features = input
            .get("input")
            .ok_or_else(|| anyhow!("Missing field 'input'"))?;
        let features: Features = serde_json::from_value(features.clone()).map_err(|_| {
            anyhow!("Field 'input' must be a list of numbers or a list of lists of numbers")
        })?;

        let (xs, single) = self.features_to_tensor(features)?;
        let ys = self.forward(&xs)?;
        let ys = if single { ys.squeeze(0)? } else { ys };
        Ok(Prediction::Tensor(ys))
    }
}

/// Row-major flattening, all rows must share the same width.
fn flatten_rows(rows: Vec<Vec<f32>>) -> Result<(usize, Vec<f32>)> {
    let width = rows.first().map_or(0, Vec::len);
    let mut flat = Vec::with_capacity(width * rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        if row.len() != width {
            bail!(
                "Row {} has {} values, expected {}",
                index,
                row.len(),
                width
            );
        }
        flat.extend(row);
    }
    Ok((width, flat))
}
