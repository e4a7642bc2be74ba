//! Core types and errors for mood-signature group classification
//!
//! This crate contains the foundational types shared across all moodsig components.

use serde::{Deserialize, Serialize};

/// Clinical group a participant was linked with at the beginning of the study.
///
/// The declaration order is load-bearing: [`Diagnosis::index`] values index
/// into the anchor-ordered tables used as regression targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diagnosis {
    Healthy,
    Bipolar,
    Borderline,
}

impl Diagnosis {
    /// All clinical groups, in anchor order.
    pub const ALL: [Diagnosis; 3] = [
        Diagnosis::Healthy,
        Diagnosis::Bipolar,
        Diagnosis::Borderline,
    ];

    /// Dense index into anchor-ordered tables (0, 1, 2).
    pub fn index(self) -> usize {
        match self {
            Diagnosis::Healthy => 0,
            Diagnosis::Bipolar => 1,
            Diagnosis::Borderline => 2,
        }
    }

    /// Lowercase label matching the on-disk representation.
    pub fn label(self) -> &'static str {
        match self {
            Diagnosis::Healthy => "healthy",
            Diagnosis::Bipolar => "bipolar",
            Diagnosis::Borderline => "borderline",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One windowed observation stream for a single participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Identifier, unique within a cohort (window suffix included).
    pub id: String,
    /// Clinical group assigned at study entry.
    pub diagnosis: Diagnosis,
    /// Ordered multivariate observations, one inner vector per time step.
    pub data: Vec<Vec<f64>>,
}

/// Core error types
#[derive(thiserror::Error, Debug)]
pub enum MoodSigError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MoodSigError>;
