//! Per-pair fit/test loop and results tables.
//!
//! Runs every unordered pair of distinct clinical groups through the same
//! sequence: window and split the cohort restricted to the pair, fit the
//! regressor on the training side, classify the out-of-sample side by
//! nearest anchor, and score accuracy and AUC. A failing pair is recorded
//! and the run continues with the remaining pairs.

use moodsig_core::{Diagnosis, MoodSigError, Participant, Result};
use moodsig_model::{fit, save_weights, AnchorSet, SignatureClassifier, TrainConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::datasets;
use crate::metrics::{roc_auc, PairConfusion, PairMetrics};

/// Configuration for one pairwise evaluation run.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Directory containing `cohort.json`.
    pub data_dir: PathBuf,
    /// Directory receiving the JSON results and per-pair weights.
    pub output_dir: PathBuf,
    /// Observations per window.
    pub window_len: usize,
    /// Truncation order of the signature transform.
    pub order: usize,
    /// Fraction of windows used for training.
    pub training_fraction: f64,
    /// Seed for shuffled splits and mini-batch order.
    pub seed: u64,
    /// Upper bound on training epochs.
    pub max_epochs: usize,
    /// Prepend a normalised time coordinate to each observation.
    pub with_time_channel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("results"),
            window_len: 20,
            order: 2,
            training_fraction: 0.7,
            seed: 83042,
            max_epochs: 200,
            with_time_channel: true,
        }
    }
}

/// Scores for one group pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub group_a: Diagnosis,
    pub group_b: Diagnosis,
    pub train_size: usize,
    pub test_size: usize,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub auc: f64,
    /// Out-of-sample predictions that landed on the out-of-pair anchor.
    pub off_pair_predictions: usize,
    /// RFC3339 completion time.
    pub timestamp: String,
}

/// A pair that could not be evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    pub group_a: Diagnosis,
    pub group_b: Diagnosis,
    pub error: String,
}

/// 3x3 upper-triangular results table indexed by clinical group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultsTable {
    cells: [[Option<f64>; 3]; 3],
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: Diagnosis, col: Diagnosis, value: f64) {
        self.cells[row.index()][col.index()] = Some(value);
    }

    pub fn get(&self, row: Diagnosis, col: Diagnosis) -> Option<f64> {
        self.cells[row.index()][col.index()]
    }

    /// Render with right-aligned value columns and `NaN` for unset cells.
    pub fn render(&self) -> String {
        let labels: Vec<&str> = Diagnosis::ALL.iter().map(|d| d.label()).collect();
        let cell = |v: Option<f64>| match v {
            Some(x) => format!("{x:.4}"),
            None => "NaN".to_string(),
        };

        let index_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let col_widths: Vec<usize> = labels
            .iter()
            .enumerate()
            .map(|(j, l)| {
                (0..3)
                    .map(|i| cell(self.cells[i][j]).len())
                    .max()
                    .unwrap_or(0)
                    .max(l.len())
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (j, l) in labels.iter().enumerate() {
            out.push_str("  ");
            out.push_str(&format!("{:>width$}", l, width = col_widths[j]));
        }
        for (i, l) in labels.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("{:<width$}", l, width = index_width));
            for (j, &width) in col_widths.iter().enumerate() {
                out.push_str("  ");
                out.push_str(&format!("{:>width$}", cell(self.cells[i][j])));
            }
        }
        out
    }
}

/// Full report of one pairwise run.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseReport {
    pub outcomes: Vec<PairOutcome>,
    pub failures: Vec<PairFailure>,
    pub accuracy_table: ResultsTable,
    pub auc_table: ResultsTable,
}

impl PairwiseReport {
    /// Write the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| MoodSigError::Data(format!("failed to write {}: {e}", path.display())))
    }
}

/// Run the full pairwise evaluation described by `config`.
///
/// Per-pair failures do not abort the run; they are collected in the
/// report's `failures` list.
///
/// # Errors
///
/// Returns an error if the cohort cannot be loaded or windowed, or if the
/// output directory cannot be created.
pub fn run_pairwise(config: &EvalConfig) -> Result<PairwiseReport> {
    let records = datasets::load_cohort(&config.data_dir)?;
    info!(records = records.len(), "cohort loaded");
    let windows = datasets::build_windows(&records, config.window_len, config.with_time_channel)?;
    info!(windows = windows.len(), "windows built");

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        MoodSigError::Data(format!(
            "failed to create output dir {}: {e}",
            config.output_dir.display()
        ))
    })?;

    let anchors = AnchorSet::default();
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();
    let mut accuracy_table = ResultsTable::new();
    let mut auc_table = ResultsTable::new();

    for (i, &group_a) in Diagnosis::ALL.iter().enumerate() {
        for &group_b in &Diagnosis::ALL[i + 1..] {
            match evaluate_pair(&windows, group_a, group_b, &anchors, config) {
                Ok(outcome) => {
                    accuracy_table.set(group_a, group_b, outcome.accuracy);
                    auc_table.set(group_a, group_b, outcome.auc);
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(%group_a, %group_b, error = %e, "pair evaluation failed");
                    failures.push(PairFailure {
                        group_a,
                        group_b,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(PairwiseReport {
        outcomes,
        failures,
        accuracy_table,
        auc_table,
    })
}

fn evaluate_pair(
    windows: &[Participant],
    group_a: Diagnosis,
    group_b: Diagnosis,
    anchors: &AnchorSet,
    config: &EvalConfig,
) -> Result<PairOutcome> {
    info!("Loading {group_a} and {group_b}...");
    let pair = datasets::filter_groups(windows, group_a, group_b);
    let (train, test) = datasets::split_train_test(&pair, config.training_fraction, config.seed)?;
    if train.is_empty() {
        return Err(MoodSigError::Data(format!(
            "no training windows for {group_a}/{group_b}"
        )));
    }
    if test.is_empty() {
        return Err(MoodSigError::Data(format!(
            "no out-of-sample windows for {group_a}/{group_b}"
        )));
    }
    info!(train = train.len(), test = test.len(), "Done.");

    info!("Training the model...");
    let train_config = TrainConfig {
        order: config.order,
        seed: config.seed,
        max_epochs: config.max_epochs,
        ..TrainConfig::default()
    };
    let (model, varmap) = fit(&train, anchors, &train_config)?;
    info!("Done.");

    info!("Testing the model...");
    let classifier = SignatureClassifier::new(&model, anchors, config.order);
    let mut confusion = PairConfusion::new(group_a, group_b);
    let mut scores = Vec::with_capacity(test.len());
    for participant in &test {
        let point = classifier.predict_point(participant)?;
        confusion.record(participant.diagnosis, anchors.nearest(point));
        scores.push((
            anchors.margin(point, group_a, group_b),
            participant.diagnosis == group_b,
        ));
    }
    let metrics = PairMetrics::from_confusion(&confusion);
    let auc = roc_auc(&scores);
    info!("Done.");

    let weights_path = config
        .output_dir
        .join(format!("weights_{group_a}_{group_b}.safetensors"));
    save_weights(&varmap, &weights_path)?;

    Ok(PairOutcome {
        group_a,
        group_b,
        train_size: train.len(),
        test_size: test.len(),
        accuracy: metrics.accuracy,
        balanced_accuracy: metrics.balanced_accuracy,
        auc,
        off_pair_predictions: confusion.off_pair,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_config_defaults_reproduce_original_run() {
        let config = EvalConfig::default();
        assert_eq!(config.window_len, 20);
        assert_eq!(config.order, 2);
        assert!((config.training_fraction - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.seed, 83042);
        assert!(config.with_time_channel);
    }

    #[test]
    fn test_results_table_set_get() {
        let mut table = ResultsTable::new();
        table.set(Diagnosis::Healthy, Diagnosis::Bipolar, 0.75);
        assert_eq!(table.get(Diagnosis::Healthy, Diagnosis::Bipolar), Some(0.75));
        assert_eq!(table.get(Diagnosis::Bipolar, Diagnosis::Healthy), None);
    }

    #[test]
    fn test_results_table_render() {
        let mut table = ResultsTable::new();
        table.set(Diagnosis::Healthy, Diagnosis::Bipolar, 0.75);
        table.set(Diagnosis::Healthy, Diagnosis::Borderline, 2.0 / 3.0);
        table.set(Diagnosis::Bipolar, Diagnosis::Borderline, 0.8);
        let rendered = table.render();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("healthy"));
        assert!(lines[0].contains("borderline"));
        assert!(lines[1].starts_with("healthy"));
        assert!(lines[1].contains("0.7500"));
        assert!(lines[1].contains("0.6667"));
        // The lower triangle and diagonal stay empty.
        assert!(lines[1].contains("NaN"));
        assert!(lines[3].starts_with("borderline"));
        assert!(!lines[3].contains('.'));
    }

    #[test]
    fn test_run_pairwise_missing_cohort_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvalConfig {
            data_dir: dir.path().join("nowhere"),
            output_dir: dir.path().join("out"),
            ..EvalConfig::default()
        };
        let err = run_pairwise(&config).unwrap_err();
        assert!(err.to_string().contains("cohort.json"));
    }
}
