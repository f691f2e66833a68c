// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network and training code lives here. Data and
// application layers see the model only through the
// SentimentModel / ModelTrainer traits.
//
//   model.rs      — SentimentNet (Linear → ReLU → Linear) and
//                   TrainedClassifier, its frozen, shareable
//                   form used for scoring
//
//   trainer.rs    — Adam training loop over the encoded
//                   dataset, per-epoch metrics
//
//   inferencer.rs — InferenceEngine: encode → score → decide,
//                   with single-flight lazy training
//
// Backends: NdArray for inference, Autodiff<NdArray> for
// training. Nothing here needs a GPU.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Feed-forward network and its frozen form
pub mod model;

/// Training loop and hyper-parameters
pub mod trainer;

/// Inference engine with lazy single-flight training
pub mod inferencer;
