//! Nearest-anchor classification for out-of-sample participants.

use moodsig_core::{Diagnosis, Participant, Result};

use crate::anchors::AnchorSet;
use crate::regressor::SignatureRegressor;
use crate::signature::stream_signature;

/// A trained regressor together with the anchor set it was fitted against.
pub struct SignatureClassifier<'a> {
    regressor: &'a SignatureRegressor,
    anchors: &'a AnchorSet,
    order: usize,
}

impl<'a> SignatureClassifier<'a> {
    pub fn new(regressor: &'a SignatureRegressor, anchors: &'a AnchorSet, order: usize) -> Self {
        Self {
            regressor,
            anchors,
            order,
        }
    }

    /// Embedding point predicted for one participant's stream.
    pub fn predict_point(&self, participant: &Participant) -> Result<[f64; 2]> {
        let sig = stream_signature(&participant.data, self.order)?;
        self.regressor.predict(&sig)
    }

    /// Clinical group whose anchor is nearest to the predicted point.
    pub fn predict(&self, participant: &Participant) -> Result<Diagnosis> {
        Ok(self.anchors.nearest(self.predict_point(participant)?))
    }
}
