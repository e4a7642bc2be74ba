//! Pairwise evaluation of the mood-signature classifier.
//!
//! Classifies participants according to the clinical group they were linked
//! with at the beginning of the study, one group pair at a time:
//!
//! - [`datasets`] — cohort loading, windowing, and train/test splitting
//! - [`metrics`] — accuracy and rank-based ROC/AUC for a group pair
//! - [`runner`] — per-pair fit/test loop and results tables

pub mod datasets;
pub mod metrics;
pub mod runner;

/// Re-export commonly used types for evaluation callers.
pub mod prelude {
    pub use crate::datasets::{build_windows, load_cohort, split_train_test, CohortRecord};
    pub use crate::metrics::{roc_auc, PairConfusion, PairMetrics};
    pub use crate::runner::{run_pairwise, EvalConfig, PairOutcome, PairwiseReport, ResultsTable};
}
