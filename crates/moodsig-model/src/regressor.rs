//! MLP regressor mapping signature features to a point on the embedding plane.
//!
//! A two-layer fully-connected network:
//!
//! ```text
//! Input (signature_dim) → Linear(64) → ReLU → Linear(2)
//! ```
//!
//! The output is an unconstrained 2D point; classification happens
//! downstream by nearest-anchor search.

use candle_core::{DType, Device, Tensor};
use candle_nn::{Module, VarBuilder, VarMap};
use moodsig_core::{MoodSigError, Result};

/// Dimension of the output embedding plane.
pub const EMBEDDING_DIM: usize = 2;

/// Hidden layer width.
const HIDDEN: usize = 64;

/// Two-layer regressor from signature space onto the embedding plane.
pub struct SignatureRegressor {
    fc1: candle_nn::Linear,
    fc2: candle_nn::Linear,
    input_dim: usize,
    device: Device,
}

impl SignatureRegressor {
    /// Create a regressor whose weights live in the given `varmap`, so they
    /// can be optimised and saved by the caller.
    pub fn new_trainable(varmap: &VarMap, device: &Device, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(MoodSigError::Model(
                "regressor input dimension must be nonzero".to_string(),
            ));
        }
        let vb = VarBuilder::from_varmap(varmap, DType::F32, device);

        let fc1 = candle_nn::linear(input_dim, HIDDEN, vb.pp("fc1"))
            .map_err(|e| MoodSigError::Model(format!("failed to create fc1: {e}")))?;
        let fc2 = candle_nn::linear(HIDDEN, EMBEDDING_DIM, vb.pp("fc2"))
            .map_err(|e| MoodSigError::Model(format!("failed to create fc2: {e}")))?;

        Ok(Self {
            fc1,
            fc2,
            input_dim,
            device: device.clone(),
        })
    }

    /// Input feature dimension the regressor was built for.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Forward pass over an `[N, input_dim]` batch, producing `[N, 2]`.
    pub fn forward(&self, batch: &Tensor) -> Result<Tensor> {
        let hidden = self
            .fc1
            .forward(batch)
            .map_err(|e| MoodSigError::Model(format!("fc1 forward failed: {e}")))?;
        let hidden = hidden
            .relu()
            .map_err(|e| MoodSigError::Model(format!("relu failed: {e}")))?;
        self.fc2
            .forward(&hidden)
            .map_err(|e| MoodSigError::Model(format!("fc2 forward failed: {e}")))
    }

    /// Predict the embedding point for a single feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != self.input_dim {
            return Err(MoodSigError::Model(format!(
                "feature vector has length {}, expected {}",
                features.len(),
                self.input_dim
            )));
        }
        let input: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_vec(input, (1, self.input_dim), &self.device)
            .map_err(|e| MoodSigError::Model(format!("failed to create input tensor: {e}")))?;

        let output = self.forward(&input)?;
        let row: Vec<f32> = output
            .squeeze(0)
            .and_then(|t| t.to_vec1())
            .map_err(|e| MoodSigError::Model(format!("failed to read prediction: {e}")))?;

        Ok([row[0] as f64, row[1] as f64])
    }
}
