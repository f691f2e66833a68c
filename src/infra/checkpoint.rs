// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores a TrainedClassifier.
//
// Directory layout:
//
//   <model_dir>/
//     model_config.json   ← encoder config, label set, hidden size
//     model.mpk           ← network parameters (MessagePack)
//     metrics.csv         ← written by the trainer, not read here
//
// The config is saved separately because the network has to be
// rebuilt with the exact architecture before its parameters can
// be loaded into it, and because inference must encode text
// exactly the way training did.
//
// Parameters use NamedMpkFileRecorder with FullPrecisionSettings.
// CompactRecorder would store half precision and a reloaded model
// would no longer reproduce the original outputs bit for bit.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::data::encoder::EncoderConfig;
use crate::domain::sentiment::LabelSet;
use crate::domain::traits::SentimentModel;
use crate::error::{Result, SentimentError};
use crate::ml::model::{InferBackend, InferDevice, SentimentNet, SentimentNetConfig, TrainedClassifier};

const CONFIG_FILE: &str = "model_config.json";
const WEIGHTS_STEM: &str = "model";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Everything needed to rebuild the network and its encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredModelConfig {
    pub encoder:     EncoderConfig,
    pub label_set:   LabelSet,
    pub hidden_size: usize,
}

/// Reads and writes one model directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True if a saved model config exists in the directory
    pub fn exists(&self) -> bool {
        self.dir.join(CONFIG_FILE).exists()
    }

    pub fn save(&self, model: &TrainedClassifier) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let stored = StoredModelConfig {
            encoder:     *model.encoder_config(),
            label_set:   model.label_set(),
            hidden_size: model.hidden_size(),
        };
        let config_path = self.dir.join(CONFIG_FILE);
        fs::write(&config_path, serde_json::to_string_pretty(&stored)?)?;

        // The recorder appends the .mpk extension itself
        let weights_path = self.dir.join(WEIGHTS_STEM);
        WeightsRecorder::new()
            .record(model.to_net().into_record(), weights_path.clone())
            .map_err(|e| {
                SentimentError::Checkpoint(format!(
                    "cannot save weights to '{}': {e:?}",
                    weights_path.display()
                ))
            })?;

        tracing::info!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<StoredModelConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| {
            SentimentError::Checkpoint(format!(
                "cannot read '{}': {e}. Has a model been trained into this directory?",
                path.display()
            ))
        })?;
        let stored: StoredModelConfig = serde_json::from_str(&json)?;
        stored.encoder.validate()?;
        Ok(stored)
    }

    pub fn load(&self) -> Result<TrainedClassifier> {
        let stored = self.load_config()?;
        let device = InferDevice::default();

        let weights_path = self.dir.join(WEIGHTS_STEM);
        let record = WeightsRecorder::new()
            .load(weights_path.clone(), &device)
            .map_err(|e| {
                SentimentError::Checkpoint(format!(
                    "cannot load weights from '{}': {e:?}",
                    weights_path.display()
                ))
            })?;

        let net_cfg = SentimentNetConfig::new(
            stored.encoder.feature_len(),
            stored.hidden_size,
            stored.label_set.output_units(),
        );
        let net: SentimentNet<InferBackend> = net_cfg.init(&device).load_record(record);

        tracing::debug!("Loaded model from '{}'", self.dir.display());
        TrainedClassifier::from_net(net, stored.encoder, stored.label_set)
    }
}
