// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The engine only ever talks to these two seams:
//
//   SentimentModel — a trained, read-only scorer
//                    (TrainedClassifier, or a stub in tests)
//   ModelTrainer   — something that fits a model on a dataset
//                    (Trainer, or a counting stub in tests)
//
// Both are object-safe so the engine can hold Arc<dyn ...>.

use std::sync::Arc;

use crate::data::dataset::SentimentDataset;
use crate::data::encoder::EncoderConfig;
use crate::domain::sentiment::LabelSet;
use crate::error::Result;

// ─── ModelOutput ──────────────────────────────────────────────────────────────
/// Raw numeric output of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Binary models: probability of `Positive`, in [0, 1]
    Probability(f32),

    /// Multi-class models: one softmax score per class, in
    /// `LabelSet::classes()` order
    Scores(Vec<f32>),
}

// ─── SentimentModel ───────────────────────────────────────────────────────────
/// A trained model. Never mutated after fitting, so it is shared
/// behind an `Arc` and read concurrently without locking.
pub trait SentimentModel: Send + Sync {
    /// The encoder configuration the model was trained with.
    /// Inference must use exactly the same one.
    fn encoder_config(&self) -> &EncoderConfig;

    fn label_set(&self) -> LabelSet;

    /// Score one encoded feature vector.
    fn score(&self, features: &[f32]) -> Result<ModelOutput>;
}

// ─── ModelTrainer ─────────────────────────────────────────────────────────────
/// Fits a model on an encoded dataset. Reads the dataset only.
///
/// Implementations run synchronously; the engine moves the call
/// onto a blocking thread.
pub trait ModelTrainer: Send + Sync {
    fn fit(&self, dataset: &SentimentDataset) -> Result<Arc<dyn SentimentModel>>;
}
