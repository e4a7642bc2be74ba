//! Metrics for pairwise group classification.
//!
//! - **Accuracy / balanced accuracy** — computed from a per-pair confusion
//!   matrix in which the second group of the pair is the positive class.
//! - **ROC AUC** — rank-based (Mann-Whitney) with midrank tie correction,
//!   over a continuous score such as the anchor margin.

use moodsig_core::Diagnosis;
use serde::{Deserialize, Serialize};

/// Confusion counts for one group pair. The second group (`group_b`) is the
/// positive class.
///
/// Nearest-anchor search ranges over all three anchors, so a prediction can
/// land on the out-of-pair group; such predictions are counted as errors in
/// the 2x2 cells and additionally tracked in `off_pair`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairConfusion {
    pub group_a: Diagnosis,
    pub group_b: Diagnosis,
    /// `group_b` windows predicted as `group_b`.
    pub tp: usize,
    /// `group_a` windows predicted as `group_a`.
    pub tn: usize,
    /// `group_a` windows predicted as anything else.
    pub fp: usize,
    /// `group_b` windows predicted as anything else.
    pub fn_: usize,
    /// Predictions that landed on the out-of-pair anchor.
    pub off_pair: usize,
}

impl PairConfusion {
    pub fn new(group_a: Diagnosis, group_b: Diagnosis) -> Self {
        Self {
            group_a,
            group_b,
            tp: 0,
            tn: 0,
            fp: 0,
            fn_: 0,
            off_pair: 0,
        }
    }

    /// Record one prediction for a window whose true group is `actual`.
    pub fn record(&mut self, actual: Diagnosis, predicted: Diagnosis) {
        if predicted != self.group_a && predicted != self.group_b {
            self.off_pair += 1;
        }
        if actual == self.group_b {
            if predicted == self.group_b {
                self.tp += 1;
            } else {
                self.fn_ += 1;
            }
        } else if predicted == self.group_a {
            self.tn += 1;
        } else {
            self.fp += 1;
        }
    }

    /// Total number of recorded windows.
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Summary metrics computed from a pair confusion matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairMetrics {
    /// Overall accuracy.
    pub accuracy: f64,
    /// Mean of the two per-group recalls, robust to class imbalance.
    pub balanced_accuracy: f64,
}

impl PairMetrics {
    pub fn from_confusion(cm: &PairConfusion) -> Self {
        let total = cm.total() as f64;
        let accuracy = if total > 0.0 {
            (cm.tp + cm.tn) as f64 / total
        } else {
            0.0
        };

        let recall_b = if cm.tp + cm.fn_ > 0 {
            cm.tp as f64 / (cm.tp + cm.fn_) as f64
        } else {
            0.0
        };
        let recall_a = if cm.tn + cm.fp > 0 {
            cm.tn as f64 / (cm.tn + cm.fp) as f64
        } else {
            0.0
        };
        let balanced_accuracy = (recall_a + recall_b) / 2.0;

        Self {
            accuracy,
            balanced_accuracy,
        }
    }
}

/// Rank-based (Mann-Whitney) ROC AUC over `(score, is_positive)` pairs,
/// with midrank correction for tied scores.
///
/// Degenerate inputs (empty, or a single class) score 0.5.
pub fn roc_auc(scores: &[(f64, bool)]) -> f64 {
    let pos = scores.iter().filter(|(_, y)| *y).count();
    let neg = scores.len() - pos;
    if pos == 0 || neg == 0 {
        return 0.5;
    }

    let mut sorted: Vec<(f64, bool)> = scores.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    // Sum of 1-based midranks over the positive class.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1].0 == sorted[i].0 {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for item in &sorted[i..=j] {
            if item.1 {
                rank_sum += midrank;
            }
        }
        i = j + 1;
    }

    (rank_sum - (pos * (pos + 1)) as f64 / 2.0) / (pos * neg) as f64
}
