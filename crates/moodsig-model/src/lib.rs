//! Signature features, anchor embedding, and the regression classifier.
//!
//! The model pipeline is: truncated path signature of a mood stream
//! ([`signature`]) → MLP regressor onto the embedding plane ([`regressor`],
//! trained by [`trainer`]) → nearest clinical-group anchor ([`anchors`],
//! composed in [`classifier`]).

pub mod anchors;
pub mod classifier;
pub mod regressor;
pub mod signature;
pub mod trainer;

pub use anchors::AnchorSet;
pub use classifier::SignatureClassifier;
pub use regressor::{SignatureRegressor, EMBEDDING_DIM};
pub use signature::{signature_dim, stream_signature};
pub use trainer::{fit, save_weights, TrainConfig};
