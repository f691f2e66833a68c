// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits a SentimentNet on an encoded dataset with Adam.
//
// Order of work in one fit:
//   1. Reject an empty dataset
//   2. Filter, index-aligned: drop samples longer than the
//      encoder's feature length and samples whose label is not
//      in the label set; any other wrong length fails the fit
//   3. epochs × batches from Burn's DataLoader, in dataset
//      order (no shuffling, single worker, so two fits on the
//      same data see the same batch sequence; the last batch
//      may be short)
//   4. Freeze the final parameters into a TrainedClassifier
//
// Burn reports shape and numeric errors by panicking. The loop
// runs under catch_unwind and every panic or non-finite loss
// becomes TrainingFailed; the half-trained model is dropped.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{BinaryCrossEntropyLossConfig, CrossEntropyLossConfig},
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::{SentimentBatch, SentimentBatcher},
    dataset::{EncodedSample, SentimentDataset},
};
use crate::data::encoder::EncoderConfig;
use crate::domain::sentiment::LabelSet;
use crate::domain::traits::{ModelTrainer, SentimentModel};
use crate::error::{Result, SentimentError};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{SentimentNet, SentimentNetConfig, TrainedClassifier};

type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub batch_size:    usize,
    pub epochs:        usize,
    pub learning_rate: f64,
    pub hidden_size:   usize,
    pub label_set:     LabelSet,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size:    32,
            epochs:        10,
            learning_rate: 1e-3,
            hidden_size:   8,
            label_set:     LabelSet::Ternary,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.epochs == 0 || self.hidden_size == 0 {
            return Err(SentimentError::InvalidConfig(format!(
                "batch_size, epochs and hidden_size must be positive, got {}/{}/{}",
                self.batch_size, self.epochs, self.hidden_size
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SentimentError::InvalidConfig(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer {
    config:  TrainConfig,
    encoder: EncoderConfig,
    metrics: Option<MetricsLogger>,
}

impl Trainer {
    pub fn new(config: TrainConfig, encoder: EncoderConfig) -> Result<Self> {
        config.validate()?;
        encoder.validate()?;
        Ok(Self { config, encoder, metrics: None })
    }

    /// Append per-epoch metrics to a CSV file.
    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Fit a new classifier. Reads `dataset`, never modifies it.
    pub fn train(&self, dataset: &SentimentDataset) -> Result<TrainedClassifier> {
        if dataset.is_empty() {
            return Err(SentimentError::EmptyDataset);
        }

        let samples = self.usable_samples(dataset)?;
        tracing::info!(
            "Training on {} of {} samples: {} epochs, batch_size={}, hidden={}",
            samples.len(),
            dataset.sample_count(),
            self.config.epochs,
            self.config.batch_size,
            self.config.hidden_size,
        );

        let usable = SentimentDataset::new(samples);
        match panic::catch_unwind(AssertUnwindSafe(|| self.train_loop(usable))) {
            Ok(result) => result,
            Err(payload) => Err(SentimentError::TrainingFailed(panic_message(payload.as_ref()))),
        }
    }

    /// Index-aligned filtering: a dropped sample takes its label with it.
    fn usable_samples(&self, dataset: &SentimentDataset) -> Result<Vec<EncodedSample>> {
        let expected = self.encoder.feature_len();
        let mut too_long    = 0usize;
        let mut other_label = 0usize;
        let mut kept        = Vec::with_capacity(dataset.sample_count());

        for (index, sample) in dataset.samples().iter().enumerate() {
            if sample.features.len() > expected {
                too_long += 1;
                continue;
            }
            if self.config.label_set.index_of(sample.label).is_none() {
                other_label += 1;
                continue;
            }
            if sample.features.len() != expected {
                return Err(SentimentError::ShapeMismatch {
                    index,
                    expected,
                    actual: sample.features.len(),
                });
            }
            kept.push(sample.clone());
        }

        if too_long > 0 {
            tracing::warn!("Excluded {} samples longer than {} features", too_long, expected);
        }
        if other_label > 0 {
            tracing::warn!(
                "Excluded {} samples with labels outside {:?}",
                other_label,
                self.config.label_set
            );
        }
        if kept.is_empty() {
            return Err(SentimentError::EmptyDataset);
        }
        Ok(kept)
    }

    /// `dataset` holds only usable samples.
    fn train_loop(&self, dataset: SentimentDataset) -> Result<TrainedClassifier> {
        let cfg       = &self.config;
        let label_set = cfg.label_set;
        let device    = burn::backend::ndarray::NdArrayDevice::default();
        let samples   = dataset.sample_count();

        let net_cfg = SentimentNetConfig::new(
            self.encoder.feature_len(),
            cfg.hidden_size,
            label_set.output_units(),
        );
        let mut model: SentimentNet<TrainBackend> = net_cfg.init(&device);

        // ── Adam optimiser ────────────────────────────────────────────────────
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

        // ── Training data loader ──────────────────────────────────────────────
        let loader = data_loader(
            SentimentBatcher::new(label_set, self.encoder.input_scale()),
            cfg.batch_size,
            &device,
            dataset,
        );

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;
            let mut correct  = 0usize;

            for batch in loader.iter() {
                let logits = model.forward(batch.features);

                correct += count_correct(logits.clone(), batch.targets.clone(), label_set);
                let loss = classification_loss(logits, batch.targets, label_set);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    return Err(SentimentError::TrainingFailed(format!(
                        "non-finite loss {loss_val} at epoch {epoch}, batch {}",
                        batches + 1
                    )));
                }
                loss_sum += loss_val;
                batches  += 1;

                // Backward pass + Adam update
                let grads = loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(cfg.learning_rate, model, grads);
            }

            let metrics = EpochMetrics::new(
                epoch,
                loss_sum / batches.max(1) as f64,
                correct as f64 / samples as f64,
                samples,
            );
            tracing::info!(
                "Epoch {:>3}/{} | loss={:.4} | acc={:.1}%",
                epoch, cfg.epochs, metrics.loss, metrics.accuracy * 100.0,
            );
            if let Some(logger) = &self.metrics {
                logger.log(&metrics)?;
            }
        }

        // model.valid() drops the autodiff wrapper; parameters are frozen from here
        TrainedClassifier::from_net(model.valid(), self.encoder, label_set)
    }
}

impl ModelTrainer for Trainer {
    fn fit(&self, dataset: &SentimentDataset) -> Result<Arc<dyn SentimentModel>> {
        Ok(Arc::new(self.train(dataset)?))
    }
}

/// In-order loader over `dataset`: no shuffle, no worker threads.
fn data_loader(
    batcher:    SentimentBatcher,
    batch_size: usize,
    device:     &<TrainBackend as Backend>::Device,
    dataset:    SentimentDataset,
) -> Arc<dyn DataLoader<TrainBackend, SentimentBatch<TrainBackend>>> {
    DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .set_device(device.clone())
        .build(dataset)
}

/// Cross-entropy over softmax for ≥3 classes, binary cross-entropy
/// over a sigmoid for 2. Both take raw logits.
fn classification_loss<B: Backend>(
    logits:    Tensor<B, 2>,
    targets:   Tensor<B, 1, Int>,
    label_set: LabelSet,
) -> Tensor<B, 1> {
    let device = logits.device();
    match label_set {
        LabelSet::Ternary => CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits, targets),
        LabelSet::Binary => {
            let [batch_size, _] = logits.dims();
            BinaryCrossEntropyLossConfig::new()
                .with_logits(true)
                .init(&device)
                .forward(logits.reshape([batch_size]), targets)
        }
    }
}

fn count_correct<B: Backend>(
    logits:    Tensor<B, 2>,
    targets:   Tensor<B, 1, Int>,
    label_set: LabelSet,
) -> usize {
    let predicted = match label_set {
        // argmax(1) returns [batch, 1], flatten before comparing
        LabelSet::Ternary => logits.argmax(1).flatten::<1>(0, 1),
        LabelSet::Binary  => logits.greater_elem(0.0).int().flatten::<1>(0, 1),
    };
    let hits: i64 = predicted.equal(targets).int().sum().into_scalar().elem::<i64>();
    hits.max(0) as usize
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "numeric backend panicked".to_string()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::TextEncoder;
    use crate::domain::sentiment::{Category, RawSample};
    use crate::domain::traits::ModelOutput;

    fn three_records() -> Vec<RawSample> {
        vec![
            RawSample::new("i love this", Category::Positive),
            RawSample::new("i hate this", Category::Negative),
            RawSample::new("it is fine",  Category::Neutral),
        ]
    }

    fn fast_config() -> TrainConfig {
        TrainConfig {
            batch_size:    2,
            epochs:        3,
            learning_rate: 1e-2,
            hidden_size:   8,
            label_set:     LabelSet::Ternary,
        }
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let trainer = Trainer::new(fast_config(), EncoderConfig::new(10)).unwrap();
        let err = trainer.train(&SentimentDataset::default()).unwrap_err();
        assert!(matches!(err, SentimentError::EmptyDataset));
    }

    #[test]
    fn test_fit_produces_scoring_model() {
        let encoder = TextEncoder::new(EncoderConfig::new(10)).unwrap();
        let dataset = SentimentDataset::encode(&three_records(), &encoder);
        let trainer = Trainer::new(fast_config(), *encoder.config()).unwrap();

        let model = trainer.train(&dataset).unwrap();
        assert_eq!(model.encoder_config(), encoder.config());
        let out = model.score(&encoder.encode("i love this")).unwrap();
        assert!(matches!(out, ModelOutput::Scores(ref s) if s.len() == 3));
    }

    #[test]
    fn test_overlong_samples_are_excluded() {
        let samples = vec![
            EncodedSample::new(vec![1.0; 4], Category::Positive),
            EncodedSample::new(vec![1.0; 9], Category::Negative),
        ];
        let trainer = Trainer::new(fast_config(), EncoderConfig::new(4)).unwrap();
        let kept = trainer.usable_samples(&SentimentDataset::new(samples)).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, Category::Positive);
    }

    #[test]
    fn test_only_overlong_samples_is_empty() {
        let samples = vec![EncodedSample::new(vec![1.0; 9], Category::Negative)];
        let trainer = Trainer::new(fast_config(), EncoderConfig::new(4)).unwrap();
        let err = trainer.train(&SentimentDataset::new(samples)).unwrap_err();
        assert!(matches!(err, SentimentError::EmptyDataset));
    }

    #[test]
    fn test_short_sample_fails_with_shape_mismatch() {
        let samples = vec![
            EncodedSample::new(vec![1.0; 4], Category::Positive),
            EncodedSample::new(vec![1.0; 2], Category::Negative),
        ];
        let trainer = Trainer::new(fast_config(), EncoderConfig::new(4)).unwrap();
        let err = trainer.train(&SentimentDataset::new(samples)).unwrap_err();
        assert!(matches!(err, SentimentError::ShapeMismatch { index: 1, expected: 4, actual: 2 }));
    }

    #[test]
    fn test_binary_drops_neutral_and_outputs_probability() {
        let encoder = TextEncoder::new(EncoderConfig::new(10)).unwrap();
        let dataset = SentimentDataset::encode(&three_records(), &encoder);
        let config  = TrainConfig { label_set: LabelSet::Binary, ..fast_config() };
        let trainer = Trainer::new(config, *encoder.config()).unwrap();

        assert_eq!(trainer.usable_samples(&dataset).unwrap().len(), 2);
        let model = trainer.train(&dataset).unwrap();
        let out = model.score(&encoder.encode("i hate this")).unwrap();
        assert!(matches!(out, ModelOutput::Probability(p) if (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let zero_batch = TrainConfig { batch_size: 0, ..fast_config() };
        assert!(Trainer::new(zero_batch, EncoderConfig::new(4)).is_err());
        let bad_lr = TrainConfig { learning_rate: f64::NAN, ..fast_config() };
        assert!(Trainer::new(bad_lr, EncoderConfig::new(4)).is_err());
    }

    #[test]
    fn test_writes_epoch_metrics() {
        let dir     = tempfile::tempdir().unwrap();
        let logger  = MetricsLogger::new(dir.path()).unwrap();
        let encoder = TextEncoder::new(EncoderConfig::new(10)).unwrap();
        let dataset = SentimentDataset::encode(&three_records(), &encoder);
        let trainer = Trainer::new(fast_config(), *encoder.config()).unwrap().with_metrics(logger);

        trainer.train(&dataset).unwrap();
        let csv = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        // header + one row per epoch
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_loader_keeps_order_and_short_last_batch() {
        let samples = vec![
            EncodedSample::new(vec![1.0, 0.0], Category::Positive),
            EncodedSample::new(vec![2.0, 0.0], Category::Negative),
            EncodedSample::new(vec![3.0, 0.0], Category::Neutral),
        ];
        let loader = data_loader(
            SentimentBatcher::new(LabelSet::Ternary, 1.0),
            2,
            &Default::default(),
            SentimentDataset::new(samples),
        );

        let batches: Vec<_> = loader.iter().collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].features.dims(), [2, 2]);
        assert_eq!(batches[1].features.dims(), [1, 2]);

        let firsts: Vec<f32> = batches
            .iter()
            .flat_map(|b| b.features.clone().into_data().to_vec::<f32>().unwrap())
            .step_by(2)
            .collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("shape [2, 3] != [2, 4]"));
        assert_eq!(panic_message(payload.as_ref()), "shape [2, 3] != [2, 4]");
    }
}
