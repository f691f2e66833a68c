// ============================================================
// sentiment_classifier
// ============================================================
// Hash-encoded text sentiment classification.
//
//   Layer 1  cli/          clap front end for the binary
//   Layer 2  application/  use cases and SentimentConfig
//   Layer 3  domain/       categories, decision rule, traits
//   Layer 4  data/         CSV loading, encoding, batching
//   Layer 5  ml/           network, training, inference engine
//   Layer 6  infra/        model store, metrics CSV
//
// Typical use:
//
//   let engine = InferenceEngine::new(encoder, policy)?
//       .with_model(Arc::new(ModelStore::new("model").load()?))?;
//   let category = engine.predict("i love this").await?;

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;

pub use application::config::SentimentConfig;
pub use data::encoder::{EncoderConfig, FeatureScheme, TextEncoder};
pub use domain::decision::{DecisionPolicy, ThresholdTable};
pub use domain::sentiment::{Category, LabelSet, RawSample};
pub use domain::traits::{ModelOutput, ModelTrainer, SentimentModel};
pub use error::{Result, SentimentError};
pub use infra::checkpoint::ModelStore;
pub use ml::inferencer::{InferenceEngine, TrainingPlan};
pub use ml::trainer::{TrainConfig, Trainer};
