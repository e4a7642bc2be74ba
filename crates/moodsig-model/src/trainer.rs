//! Training loop for the signature regressor.
//!
//! Each training participant contributes one row: the truncated signature
//! of their stream as input, their group's anchor point as target. The
//! regressor is optimised with AdamW against an MSE loss, with seeded
//! mini-batch shuffling and early stopping once the loss plateaus.

use candle_core::{Device, Tensor};
use candle_nn::{Optimizer, VarMap};
use moodsig_core::{MoodSigError, Participant, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

use crate::anchors::AnchorSet;
use crate::regressor::{SignatureRegressor, EMBEDDING_DIM};
use crate::signature::{signature_dim, stream_signature};

/// Training configuration.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub lr: f64,
    pub weight_decay: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    pub patience: usize,
    /// Truncation order of the signature transform.
    pub order: usize,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            lr: 1e-2,
            weight_decay: 1e-4,
            batch_size: 32,
            max_epochs: 200,
            patience: 20,
            order: 2,
            seed: 83042,
        }
    }
}

/// Fit a regressor on the training set.
///
/// Returns the trained model together with its [`VarMap`], so the caller
/// can persist the weights with `varmap.save`.
///
/// # Errors
///
/// Returns a model error on an empty training set and a data error if any
/// participant's stream cannot be transformed.
pub fn fit(
    collection: &[Participant],
    anchors: &AnchorSet,
    config: &TrainConfig,
) -> Result<(SignatureRegressor, VarMap)> {
    if collection.is_empty() {
        return Err(MoodSigError::Model(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    let device = Device::Cpu;

    let d = collection[0].data.first().map(|p| p.len()).unwrap_or(0);
    let input_dim = signature_dim(d, config.order);

    let mut features: Vec<f32> = Vec::with_capacity(collection.len() * input_dim);
    let mut targets: Vec<f32> = Vec::with_capacity(collection.len() * EMBEDDING_DIM);
    for participant in collection {
        let sig = stream_signature(&participant.data, config.order)?;
        if sig.len() != input_dim {
            return Err(MoodSigError::Data(format!(
                "participant {} produced a signature of length {}, expected {}",
                participant.id,
                sig.len(),
                input_dim
            )));
        }
        features.extend(sig.iter().map(|&v| v as f32));
        targets.extend(anchors.target(participant.diagnosis).iter().map(|&v| v as f32));
    }

    let n = collection.len();
    let inputs = Tensor::from_vec(features, (n, input_dim), &device)
        .map_err(|e| MoodSigError::Model(format!("failed to create input tensor: {e}")))?;
    let labels = Tensor::from_vec(targets, (n, EMBEDDING_DIM), &device)
        .map_err(|e| MoodSigError::Model(format!("failed to create target tensor: {e}")))?;

    let varmap = VarMap::new();
    let model = SignatureRegressor::new_trainable(&varmap, &device, input_dim)?;

    let mut optimizer = candle_nn::AdamW::new(
        varmap.all_vars(),
        candle_nn::ParamsAdamW {
            lr: config.lr,
            weight_decay: config.weight_decay,
            ..Default::default()
        },
    )
    .map_err(|e| MoodSigError::Model(format!("failed to create optimizer: {e}")))?;

    let mut indices: Vec<usize> = (0..n).collect();
    let mut best_loss = f64::MAX;
    let mut patience_counter = 0usize;

    for epoch in 0..config.max_epochs {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(epoch as u64));
        indices.shuffle(&mut rng);

        let mut epoch_loss = 0.0;
        let mut batch_count = 0usize;
        for chunk in indices.chunks(config.batch_size.max(1)) {
            let batch_idx: Vec<u32> = chunk.iter().map(|&i| i as u32).collect();
            let idx = Tensor::new(batch_idx.as_slice(), &device)
                .map_err(|e| MoodSigError::Model(format!("failed to create index tensor: {e}")))?;
            let batch_inputs = inputs
                .index_select(&idx, 0)
                .map_err(|e| MoodSigError::Model(format!("batch select failed: {e}")))?;
            let batch_labels = labels
                .index_select(&idx, 0)
                .map_err(|e| MoodSigError::Model(format!("batch select failed: {e}")))?;

            let predictions = model.forward(&batch_inputs)?;
            let loss = candle_nn::loss::mse(&predictions, &batch_labels)
                .map_err(|e| MoodSigError::Model(format!("loss computation failed: {e}")))?;
            optimizer
                .backward_step(&loss)
                .map_err(|e| MoodSigError::Model(format!("backward step failed: {e}")))?;

            epoch_loss += loss
                .to_scalar::<f32>()
                .map_err(|e| MoodSigError::Model(format!("loss scalar failed: {e}")))?
                as f64;
            batch_count += 1;
        }

        let avg_loss = epoch_loss / batch_count as f64;
        tracing::debug!(epoch, avg_loss, "epoch complete");

        if avg_loss + 1e-6 < best_loss {
            best_loss = avg_loss;
            patience_counter = 0;
        } else {
            patience_counter += 1;
            if patience_counter >= config.patience {
                tracing::debug!(epoch, best_loss, "loss plateaued, stopping early");
                break;
            }
        }
    }

    Ok((model, varmap))
}

/// Persist trained weights to a safetensors file.
pub fn save_weights(varmap: &VarMap, path: &Path) -> Result<()> {
    varmap.save(path).map_err(|e| {
        MoodSigError::Model(format!("failed to save weights to {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodsig_core::Diagnosis;

    fn participant(id: &str, diagnosis: Diagnosis, offset: f64) -> Participant {
        let data = (0..10)
            .map(|t| vec![t as f64 / 9.0, offset + 0.01 * t as f64])
            .collect();
        Participant {
            id: id.to_string(),
            diagnosis,
            data,
        }
    }

    #[test]
    fn test_train_config_default() {
        let config = TrainConfig::default();
        assert_eq!(config.order, 2);
        assert_eq!(config.seed, 83042);
        assert!(config.patience < config.max_epochs);
    }

    #[test]
    fn test_fit_rejects_empty_collection() {
        let err = match fit(&[], &AnchorSet::default(), &TrainConfig::default()) {
            Err(e) => e,
            Ok(_) => panic!("expected fit to reject an empty collection"),
        };
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_fit_produces_usable_model() {
        let collection = vec![
            participant("h0", Diagnosis::Healthy, 0.1),
            participant("h1", Diagnosis::Healthy, 0.15),
            participant("b0", Diagnosis::Bipolar, 0.8),
            participant("b1", Diagnosis::Bipolar, 0.85),
        ];
        let config = TrainConfig {
            max_epochs: 5,
            ..TrainConfig::default()
        };
        let anchors = AnchorSet::default();
        let (model, _varmap) = fit(&collection, &anchors, &config).unwrap();
        assert_eq!(model.input_dim(), signature_dim(2, config.order));

        let sig = stream_signature(&collection[0].data, config.order).unwrap();
        let point = model.predict(&sig).unwrap();
        assert!(point[0].is_finite() && point[1].is_finite());
    }

    #[test]
    fn test_save_weights_writes_file() {
        let collection = vec![
            participant("h0", Diagnosis::Healthy, 0.1),
            participant("b0", Diagnosis::Bipolar, 0.8),
        ];
        let config = TrainConfig {
            max_epochs: 2,
            ..TrainConfig::default()
        };
        let (_model, varmap) = fit(&collection, &AnchorSet::default(), &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.safetensors");
        save_weights(&varmap, &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_loss_decreases_on_separable_data() {
        let collection: Vec<Participant> = (0..8)
            .map(|i| {
                if i % 2 == 0 {
                    participant(&format!("h{i}"), Diagnosis::Healthy, 0.1)
                } else {
                    participant(&format!("b{i}"), Diagnosis::Bipolar, 0.9)
                }
            })
            .collect();
        let config = TrainConfig {
            max_epochs: 50,
            ..TrainConfig::default()
        };
        let anchors = AnchorSet::default();
        // Training must run to completion without error on separable data.
        let (model, _varmap) = fit(&collection, &anchors, &config).unwrap();
        let sig = stream_signature(&collection[0].data, config.order).unwrap();
        assert!(model.predict(&sig).is_ok());
    }
}
