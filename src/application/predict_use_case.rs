// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Builds an InferenceEngine one of two ways and classifies text
// with it:
//
//   from_model_dir — load a TrainedClassifier from a ModelStore;
//                    no training happens
//   from_dataset   — hand the engine a TrainingPlan; the first
//                    predict fits the model
//
// Thresholds come from an explicit config if given, otherwise
// from the sentiment_config.json that TrainUseCase left in the
// model directory, otherwise the defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::{config::SentimentConfig, train_use_case::RUN_CONFIG_FILE};
use crate::data::loader::CsvLoader;
use crate::domain::{decision::DecisionPolicy, sentiment::Category, traits::SentimentModel};
use crate::error::Result;
use crate::infra::checkpoint::ModelStore;
use crate::ml::{
    inferencer::{InferenceEngine, TrainingPlan},
    trainer::Trainer,
};

pub struct PredictUseCase {
    engine: InferenceEngine,
}

impl PredictUseCase {
    pub fn from_model_dir(dir: impl AsRef<Path>, config: Option<SentimentConfig>) -> Result<Self> {
        let dir   = dir.as_ref();
        let model = ModelStore::new(dir).load()?;

        let config = match config {
            Some(c) => c,
            None if dir.join(RUN_CONFIG_FILE).exists() => {
                SentimentConfig::from_file(dir.join(RUN_CONFIG_FILE))?
            }
            None => SentimentConfig::default(),
        };

        // the stored model decides encoder and label set; config only adds thresholds
        let policy = DecisionPolicy::for_label_set(model.label_set(), config.thresholds);
        let engine = InferenceEngine::new(*model.encoder_config(), policy)?
            .with_model(Arc::new(model))?;
        Ok(Self { engine })
    }

    pub fn from_dataset(
        dataset:    impl Into<PathBuf>,
        config:     SentimentConfig,
        has_header: bool,
    ) -> Result<Self> {
        config.validate()?;
        let trainer = Trainer::new(config.training.clone(), config.encoder)?;
        let plan    = TrainingPlan::new(dataset, Arc::new(trainer))
            .with_loader(CsvLoader::new().with_header(has_header));

        let mut engine = InferenceEngine::new(config.encoder, config.policy())?.with_training(plan);
        if let Some(limit) = config.fit_timeout() {
            engine = engine.with_fit_timeout(limit);
        }
        Ok(Self { engine })
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub async fn predict(&self, text: &str) -> Result<Category> {
        self.engine.predict(text).await
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;
    use crate::data::encoder::EncoderConfig;
    use crate::domain::sentiment::LabelSet;
    use crate::error::SentimentError;
    use crate::ml::trainer::TrainConfig;

    const THREE_RECORDS: &str =
        "1,i love this,love,positive\n2,i hate this,hate,negative\n3,it is fine,fine,neutral\n";

    fn memorising_config() -> SentimentConfig {
        SentimentConfig {
            encoder:  EncoderConfig::new(10),
            training: TrainConfig {
                batch_size:    3,
                epochs:        300,
                learning_rate: 0.05,
                hidden_size:   16,
                label_set:     LabelSet::Ternary,
            },
            ..SentimentConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_train_then_predict_from_model_dir() {
        let dir     = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("train.csv");
        std::fs::write(&dataset, THREE_RECORDS).unwrap();
        let model_dir = dir.path().join("model");

        TrainUseCase::new(memorising_config(), &dataset, &model_dir)
            .unwrap()
            .execute()
            .await
            .unwrap();

        let use_case = PredictUseCase::from_model_dir(&model_dir, None).unwrap();
        assert!(use_case.engine().is_trained());
        assert_eq!(use_case.predict("i love this").await.unwrap(), Category::Positive);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lazy_predict_from_dataset() {
        let dir     = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("train.csv");
        std::fs::write(&dataset, format!("id,text,selected,sentiment\n{THREE_RECORDS}")).unwrap();

        let use_case = PredictUseCase::from_dataset(&dataset, memorising_config(), true).unwrap();
        assert!(!use_case.engine().is_trained());
        assert_eq!(use_case.predict("i love this").await.unwrap(), Category::Positive);
        assert!(use_case.engine().is_trained());
    }

    #[test]
    fn test_missing_model_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictUseCase::from_model_dir(dir.path().join("none"), None).err().unwrap();
        assert!(matches!(err, SentimentError::Checkpoint(_)));
    }
}
