//! Cohort loading, windowing, and train/test splitting.
//!
//! A cohort lives in a single `cohort.json` file: an array of records, each
//! holding a participant identifier, a clinical group, and the full mood
//! series recorded over the study. Records are sliced into fixed-length,
//! non-overlapping windows; every window becomes one [`Participant`] and is
//! classified independently.

use moodsig_core::{Diagnosis, MoodSigError, Participant, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One participant's raw entry in `cohort.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortRecord {
    /// Participant identifier, unique within the cohort.
    pub id: String,
    /// Clinical group assigned at study entry.
    pub diagnosis: Diagnosis,
    /// Full mood series, one inner vector per observation.
    pub series: Vec<Vec<f64>>,
}

/// Load the cohort file from a data directory.
///
/// # Errors
///
/// Returns a data error naming the path if the file cannot be read or parsed.
pub fn load_cohort(data_dir: &Path) -> Result<Vec<CohortRecord>> {
    let path = data_dir.join("cohort.json");
    let content = std::fs::read_to_string(&path)
        .map_err(|e| MoodSigError::Data(format!("failed to read {}: {e}", path.display())))?;
    let records: Vec<CohortRecord> = serde_json::from_str(&content)
        .map_err(|e| MoodSigError::Data(format!("failed to parse {}: {e}", path.display())))?;
    Ok(records)
}

/// Slice each record's series into non-overlapping windows of `window_len`
/// observations. Records shorter than one window contribute nothing.
///
/// When `with_time_channel` is set, a time coordinate normalised to [0, 1]
/// is prepended to every observation, so constant streams still produce
/// informative signatures.
///
/// # Errors
///
/// Returns a data error if `window_len < 2`.
pub fn build_windows(
    records: &[CohortRecord],
    window_len: usize,
    with_time_channel: bool,
) -> Result<Vec<Participant>> {
    if window_len < 2 {
        return Err(MoodSigError::Data(format!(
            "window length must be at least 2, got {window_len}"
        )));
    }

    let mut participants = Vec::new();
    for record in records {
        for (wi, window) in record
            .series
            .chunks(window_len)
            .filter(|w| w.len() == window_len)
            .enumerate()
        {
            let data: Vec<Vec<f64>> = window
                .iter()
                .enumerate()
                .map(|(t, obs)| {
                    if with_time_channel {
                        let mut point = Vec::with_capacity(obs.len() + 1);
                        point.push(t as f64 / (window_len - 1) as f64);
                        point.extend_from_slice(obs);
                        point
                    } else {
                        obs.clone()
                    }
                })
                .collect();

            participants.push(Participant {
                id: format!("{}-w{wi}", record.id),
                diagnosis: record.diagnosis,
                data,
            });
        }
    }
    Ok(participants)
}

/// Seeded, stratified split into training and out-of-sample sets.
///
/// Windows are shuffled per clinical group so both sides keep the class
/// ratio; the same seed always produces the same split.
///
/// # Errors
///
/// Returns a data error if `training_fraction` is outside (0, 1).
pub fn split_train_test(
    participants: &[Participant],
    training_fraction: f64,
    seed: u64,
) -> Result<(Vec<Participant>, Vec<Participant>)> {
    if !(training_fraction > 0.0 && training_fraction < 1.0) {
        return Err(MoodSigError::Data(format!(
            "training fraction must be in (0, 1), got {training_fraction}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for group in Diagnosis::ALL {
        let mut indices: Vec<usize> = participants
            .iter()
            .enumerate()
            .filter(|(_, p)| p.diagnosis == group)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        indices.shuffle(&mut rng);

        let n_train = ((indices.len() as f64) * training_fraction).round() as usize;
        let n_train = n_train.min(indices.len());
        for (k, &i) in indices.iter().enumerate() {
            if k < n_train {
                train.push(participants[i].clone());
            } else {
                test.push(participants[i].clone());
            }
        }
    }

    Ok((train, test))
}

/// Restrict a collection to the two groups of a pairwise task.
pub fn filter_groups(participants: &[Participant], a: Diagnosis, b: Diagnosis) -> Vec<Participant> {
    participants
        .iter()
        .filter(|p| p.diagnosis == a || p.diagnosis == b)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, diagnosis: Diagnosis, len: usize) -> CohortRecord {
        CohortRecord {
            id: id.to_string(),
            diagnosis,
            series: (0..len).map(|t| vec![t as f64 * 0.1]).collect(),
        }
    }

    #[test]
    fn test_build_windows_counts_and_ids() {
        let records = vec![record("p1", Diagnosis::Healthy, 45)];
        let windows = build_windows(&records, 20, false).unwrap();
        // 45 observations at window 20 -> two full windows, remainder dropped.
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, "p1-w0");
        assert_eq!(windows[1].id, "p1-w1");
        assert_eq!(windows[0].data.len(), 20);
    }

    #[test]
    fn test_build_windows_short_record_is_dropped() {
        let records = vec![
            record("short", Diagnosis::Bipolar, 10),
            record("long", Diagnosis::Bipolar, 20),
        ];
        let windows = build_windows(&records, 20, false).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id, "long-w0");
    }

    #[test]
    fn test_time_channel_is_prepended_and_normalised() {
        let records = vec![record("p1", Diagnosis::Healthy, 20)];
        let windows = build_windows(&records, 20, true).unwrap();
        let data = &windows[0].data;
        assert_eq!(data[0].len(), 2);
        assert!((data[0][0] - 0.0).abs() < 1e-12);
        assert!((data[19][0] - 1.0).abs() < 1e-12);
        // The original observation follows the time coordinate.
        assert!((data[3][1] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_window_len_below_two_is_rejected() {
        let records = vec![record("p1", Diagnosis::Healthy, 20)];
        let err = build_windows(&records, 1, false).unwrap_err();
        assert!(err.to_string().contains("window length"));
    }

    #[test]
    fn test_split_is_stratified() {
        let mut participants = Vec::new();
        for i in 0..10 {
            participants.push(Participant {
                id: format!("h{i}"),
                diagnosis: Diagnosis::Healthy,
                data: vec![vec![0.0], vec![1.0]],
            });
        }
        for i in 0..10 {
            participants.push(Participant {
                id: format!("b{i}"),
                diagnosis: Diagnosis::Bipolar,
                data: vec![vec![0.0], vec![1.0]],
            });
        }

        let (train, test) = split_train_test(&participants, 0.7, 42).unwrap();
        assert_eq!(train.len(), 14);
        assert_eq!(test.len(), 6);
        let train_healthy = train
            .iter()
            .filter(|p| p.diagnosis == Diagnosis::Healthy)
            .count();
        assert_eq!(train_healthy, 7);
    }

    #[test]
    fn test_split_is_deterministic() {
        let participants: Vec<Participant> = (0..20)
            .map(|i| Participant {
                id: format!("p{i}"),
                diagnosis: Diagnosis::Borderline,
                data: vec![vec![0.0], vec![1.0]],
            })
            .collect();

        let (train_a, test_a) = split_train_test(&participants, 0.7, 83042).unwrap();
        let (train_b, test_b) = split_train_test(&participants, 0.7, 83042).unwrap();
        let ids = |v: &[Participant]| v.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&train_a), ids(&train_b));
        assert_eq!(ids(&test_a), ids(&test_b));
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let participants = vec![Participant {
            id: "p0".to_string(),
            diagnosis: Diagnosis::Healthy,
            data: vec![vec![0.0], vec![1.0]],
        }];
        assert!(split_train_test(&participants, 0.0, 1).is_err());
        assert!(split_train_test(&participants, 1.0, 1).is_err());
        assert!(split_train_test(&participants, 1.5, 1).is_err());
    }

    #[test]
    fn test_filter_groups() {
        let participants: Vec<Participant> = Diagnosis::ALL
            .iter()
            .map(|&d| Participant {
                id: d.label().to_string(),
                diagnosis: d,
                data: vec![vec![0.0], vec![1.0]],
            })
            .collect();

        let pair = filter_groups(&participants, Diagnosis::Healthy, Diagnosis::Borderline);
        assert_eq!(pair.len(), 2);
        assert!(pair.iter().all(|p| p.diagnosis != Diagnosis::Bipolar));
    }

    #[test]
    fn test_load_cohort_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cohort(dir.path()).unwrap_err();
        assert!(err.to_string().contains("cohort.json"));
    }

    #[test]
    fn test_load_cohort_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("p1", Diagnosis::Borderline, 5)];
        std::fs::write(
            dir.path().join("cohort.json"),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();

        let loaded = load_cohort(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "p1");
        assert_eq!(loaded[0].diagnosis, Diagnosis::Borderline);
        assert_eq!(loaded[0].series.len(), 5);
    }
}
