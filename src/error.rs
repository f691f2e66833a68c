// ============================================================
// Error Types
// ============================================================
// One error enum for the whole library. The CLI wraps it in
// anyhow; an HTTP layer maps every variant to one generic
// failure response.
//
// Propagation rules:
//   - MalformedRecord never leaves the loader (logged + skipped)
//   - EmptyDataset / ShapeMismatch / TrainingFailed end one fit
//   - inference errors end one predict call, the model stays
//
// Cloneable: a failed fit hands the same error to every caller
// that was waiting on it. I/O and JSON sources sit behind Arc
// for that reason.

use std::{io, sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SentimentError {
    // Dataset
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Dataset has no usable samples")]
    EmptyDataset,

    #[error("Sample {index} has {actual} features, expected {expected}")]
    ShapeMismatch {
        index:    usize,
        expected: usize,
        actual:   usize,
    },

    // Training
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Training did not finish within {0:?}")]
    TrainingTimeout(Duration),

    // Inference
    #[error("No trained model is loaded and no training source is configured")]
    ModelNotLoaded,

    /// Reserved for partial encoders; the hashing encoder never returns it.
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Encoder configuration mismatch: model expects {model}, engine uses {engine}")]
    ConfigMismatch { model: String, engine: String },

    #[error("Model output does not fit the decision policy: {0}")]
    PolicyMismatch(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    // Configuration / persistence
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error(transparent)]
    Io(Arc<io::Error>),

    #[error(transparent)]
    Json(Arc<serde_json::Error>),
}

impl From<io::Error> for SentimentError {
    fn from(e: io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for SentimentError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, SentimentError>;
