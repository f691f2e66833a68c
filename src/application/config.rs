// ============================================================
// Layer 2 — Service Configuration
// ============================================================
// Every knob of the pipeline in one serialisable struct.
// Loaded from JSON (all sections optional), validated once at
// startup, and saved next to a trained model so inference can
// rebuild the same engine.
//
// {
//   "encoder":    { "sequence_length": 100, "vocab_size": 10000,
//                   "lowercase": true, "scheme": "compact" },
//   "training":   { "batch_size": 32, "epochs": 10,
//                   "learning_rate": 0.001, "hidden_size": 8,
//                   "label_set": "ternary" },
//   "thresholds": { "positive": 0.7, "neutral": 0.4, "negative": 0.1 },
//   "fit_timeout_secs": 600
// }

use std::{fs, path::Path, time::Duration};
use serde::{Deserialize, Serialize};

use crate::data::encoder::EncoderConfig;
use crate::domain::decision::{DecisionPolicy, ThresholdTable};
use crate::error::Result;
use crate::ml::trainer::TrainConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub encoder:          EncoderConfig,
    pub training:         TrainConfig,
    pub thresholds:       ThresholdTable,
    pub fit_timeout_secs: Option<u64>,
}

impl SentimentConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json   = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::debug!("Loaded config from '{}'", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Thresholds are validated on construction / deserialisation.
    pub fn validate(&self) -> Result<()> {
        self.encoder.validate()?;
        self.training.validate()?;
        Ok(())
    }

    pub fn policy(&self) -> DecisionPolicy {
        DecisionPolicy::for_label_set(self.training.label_set, self.thresholds)
    }

    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_secs.map(Duration::from_secs)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::LabelSet;

    #[test]
    fn test_empty_json_is_default() {
        let config: SentimentConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SentimentConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.policy(), DecisionPolicy::Argmax(LabelSet::Ternary));
    }

    #[test]
    fn test_partial_sections() {
        let config: SentimentConfig = serde_json::from_str(
            r#"{"training": {"label_set": "binary", "epochs": 3}, "fit_timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.training.epochs, 3);
        assert_eq!(config.training.batch_size, TrainConfig::default().batch_size);
        assert_eq!(config.fit_timeout(), Some(Duration::from_secs(5)));
        assert!(matches!(config.policy(), DecisionPolicy::Thresholds(_)));
    }

    #[test]
    fn test_partial_encoder_section() {
        let config: SentimentConfig =
            serde_json::from_str(r#"{"encoder": {"sequence_length": 20}}"#).unwrap();
        assert_eq!(config.encoder, EncoderConfig::new(20));
    }

    #[test]
    fn test_rejects_bad_thresholds_at_load() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"thresholds": {"positive": 0.2, "neutral": 0.4, "negative": 0.6}}"#)
            .unwrap();
        assert!(SentimentConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_rejects_zero_sequence_length() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"encoder": {"sequence_length": 0, "vocab_size": 10, "lowercase": true}}"#)
            .unwrap();
        assert!(SentimentConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("config.json");
        let config = SentimentConfig { fit_timeout_secs: Some(30), ..Default::default() };
        config.save(&path).unwrap();
        assert_eq!(SentimentConfig::from_file(&path).unwrap(), config);
    }
}
