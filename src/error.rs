use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the encoder, the classifier and the training pipeline
#[derive(Debug, Error)]
pub enum DelayError {
    #[error("Model unavailable: no artifact loaded from {}", path.display())]
    ModelUnavailable { path: PathBuf },

    #[error("Feature mismatch: expected columns {expected:?}, got {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Length mismatch: {features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Cannot train on an empty dataset")]
    EmptyDataset,

    #[error("Labels must contain both classes: {negatives} negative, {positives} positive")]
    DegenerateLabels { negatives: usize, positives: usize },

    #[error("Invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(i64),

    #[error("Unsupported model artifact version {found} (expected {expected})")]
    UnsupportedArtifact { found: u32, expected: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DelayError>;
