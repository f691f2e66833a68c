// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates an offline training run in order:
//
//   Step 1: Load the CSV dataset        (Layer 4 - data)
//   Step 2: Encode every record         (Layer 4 - data)
//   Step 3: Fit the network             (Layer 5 - ml)
//   Step 4: Save model + config         (Layer 6 - infra)
//
// Output directory:
//
//   <model_dir>/
//     model_config.json     ← ModelStore
//     model.mpk             ← ModelStore
//     metrics.csv           ← MetricsLogger, one row per epoch
//     sentiment_config.json ← the full SentimentConfig of this run
//
// Reference: Burn Book §5 (Training)

use std::path::{Path, PathBuf};

use crate::application::config::SentimentConfig;
use crate::data::{dataset::SentimentDataset, encoder::TextEncoder, loader::CsvLoader};
use crate::error::{Result, SentimentError};
use crate::infra::{checkpoint::ModelStore, metrics::MetricsLogger};
use crate::ml::{model::TrainedClassifier, trainer::Trainer};

/// Saved next to the model so `predict` can rebuild the same policy
pub const RUN_CONFIG_FILE: &str = "sentiment_config.json";

pub struct TrainUseCase {
    config:    SentimentConfig,
    dataset:   PathBuf,
    model_dir: PathBuf,
    loader:    CsvLoader,
}

impl TrainUseCase {
    pub fn new(
        config:    SentimentConfig,
        dataset:   impl Into<PathBuf>,
        model_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dataset:   dataset.into(),
            model_dir: model_dir.into(),
            loader:    CsvLoader::new(),
        })
    }

    pub fn with_loader(mut self, loader: CsvLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Execute the full training pipeline end to end
    pub async fn execute(&self) -> Result<TrainedClassifier> {
        let cfg = &self.config;

        // ── Step 1: Load records ──────────────────────────────────────────────
        let raw = self.loader.load_file(&self.dataset).await?;

        // ── Step 2: Encode ────────────────────────────────────────────────────
        let encoder = TextEncoder::new(cfg.encoder)?;
        let dataset = SentimentDataset::encode(&raw, &encoder);
        tracing::info!(
            "Encoded {} samples into {} features each",
            dataset.sample_count(),
            cfg.encoder.feature_len()
        );

        // ── Step 3: Fit off the async executor ──────────────────────────────
        let metrics = MetricsLogger::new(&self.model_dir)?;
        let trainer = Trainer::new(cfg.training.clone(), cfg.encoder)?.with_metrics(metrics);
        let task    = tokio::task::spawn_blocking(move || trainer.train(&dataset));

        let joined = match cfg.fit_timeout() {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| SentimentError::TrainingTimeout(limit))?,
            None => task.await,
        };
        let model = joined
            .map_err(|e| SentimentError::TrainingFailed(format!("training task failed: {e}")))??;

        // ── Step 4: Persist ───────────────────────────────────────────────────
        ModelStore::new(&self.model_dir).save(&model)?;
        cfg.save(self.model_dir.join(RUN_CONFIG_FILE))?;

        tracing::info!("Training complete, model saved to '{}'", self.model_dir.display());
        Ok(model)
    }
}
