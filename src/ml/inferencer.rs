// ============================================================
// Layer 5 — Inference Engine
// ============================================================
// text ─► TextEncoder ─► SentimentModel::score ─► DecisionPolicy ─► Category
//
// The engine owns at most one model. It is either handed a
// trained model up front (loaded from a ModelStore) or given a
// TrainingPlan and fits one on the first predict call.
//
// Lazy fitting is single-flight. The first caller that finds
// no model spawns one fit task and leaves a watch receiver in
// the in-flight slot; every caller that arrives while the task
// runs waits on that same receiver and gets the same outcome,
// success or error. Callers that give up waiting do not stop
// the task and cannot cause a second one.
//
// Only a successful fit is published into the model slot. A
// failed or timed-out fit stays in the in-flight slot as a
// finished error, and the next caller starts a fresh one.
//
// The fit itself is CPU bound and runs on spawn_blocking. On
// timeout the task stops waiting and reports TrainingTimeout;
// the blocking thread finishes on its own.
//
// One engine per process, passed to callers explicitly.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::data::dataset::SentimentDataset;
use crate::data::encoder::{EncoderConfig, TextEncoder};
use crate::data::loader::CsvLoader;
use crate::domain::decision::DecisionPolicy;
use crate::domain::sentiment::{Category, LabelSet};
use crate::domain::traits::{ModelTrainer, SentimentModel};
use crate::error::{Result, SentimentError};

/// `None` while the fit runs.
type FitOutcome = Option<Result<Arc<dyn SentimentModel>>>;

/// Where to get training data when no model is loaded, and what
/// fits the model.
#[derive(Clone)]
pub struct TrainingPlan {
    pub dataset_path: PathBuf,
    pub loader:       CsvLoader,
    pub trainer:      Arc<dyn ModelTrainer>,
}

impl TrainingPlan {
    pub fn new(dataset_path: impl Into<PathBuf>, trainer: Arc<dyn ModelTrainer>) -> Self {
        Self { dataset_path: dataset_path.into(), loader: CsvLoader::new(), trainer }
    }

    pub fn with_loader(mut self, loader: CsvLoader) -> Self {
        self.loader = loader;
        self
    }
}

pub struct InferenceEngine {
    encoder:     TextEncoder,
    policy:      DecisionPolicy,
    model:       OnceLock<Arc<dyn SentimentModel>>,
    in_flight:   Mutex<Option<watch::Receiver<FitOutcome>>>,
    plan:        Option<TrainingPlan>,
    fit_timeout: Option<Duration>,
}

impl InferenceEngine {
    pub fn new(encoder: EncoderConfig, policy: DecisionPolicy) -> Result<Self> {
        Ok(Self {
            encoder:     TextEncoder::new(encoder)?,
            policy,
            model:       OnceLock::new(),
            in_flight:   Mutex::new(None),
            plan:        None,
            fit_timeout: None,
        })
    }

    /// Install an already trained model. Its encoder configuration
    /// and label set must match the engine's.
    pub fn with_model(mut self, model: Arc<dyn SentimentModel>) -> Result<Self> {
        check_compatible(self.encoder.config(), &self.policy, model.as_ref())?;
        self.model = OnceLock::from(model);
        Ok(self)
    }

    pub fn with_training(mut self, plan: TrainingPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_fit_timeout(mut self, limit: Duration) -> Self {
        self.fit_timeout = Some(limit);
        self
    }

    pub fn encoder(&self) -> &TextEncoder {
        &self.encoder
    }

    pub fn is_trained(&self) -> bool {
        self.model.get().is_some()
    }

    /// The trained model, fitting it first if needed.
    pub async fn model(&self) -> Result<Arc<dyn SentimentModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        let mut outcome = self.join_fit()?;
        let finished = outcome
            .wait_for(Option::is_some)
            .await
            .map(|ready| (*ready).clone())
            .map_err(|_| SentimentError::TrainingFailed("training task ended without a result".into()))?;

        let model = finished.unwrap_or_else(|| {
            Err(SentimentError::TrainingFailed("training task ended without a result".into()))
        })?;
        // every waiter holds the same Arc; only the first set lands
        let _ = self.model.set(Arc::clone(&model));
        Ok(model)
    }

    /// Classify one text. Empty text is valid input.
    pub async fn predict(&self, text: &str) -> Result<Category> {
        let model    = self.model().await?;
        let features = self.encoder.encode(text);
        let output   = model.score(&features)?;
        let category = self.policy.decide(&output)?;

        tracing::debug!("Predicted {} ({:?}) for {} chars", category, output, text.len());
        Ok(category)
    }

    /// Receiver for the running (or just succeeded) fit, starting
    /// one if there is none or the last one failed.
    fn join_fit(&self) -> Result<watch::Receiver<FitOutcome>> {
        let plan = self.plan.as_ref().ok_or(SentimentError::ModelNotLoaded)?;
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = slot.as_ref() {
            let sender_alive = rx.has_changed().is_ok();
            let reusable = match &*rx.borrow() {
                Some(Ok(_))  => true,
                Some(Err(_)) => false,
                None         => sender_alive,
            };
            if reusable {
                return Ok(rx.clone());
            }
        }

        let (tx, rx) = watch::channel(None);
        let job = FitJob {
            plan:    plan.clone(),
            encoder: self.encoder.clone(),
            policy:  self.policy.clone(),
            timeout: self.fit_timeout,
        };
        tokio::spawn(async move {
            let outcome = job.run().await;
            if let Err(e) = &outcome {
                tracing::warn!("Training failed: {e}");
            }
            tx.send_replace(Some(outcome));
        });

        *slot = Some(rx.clone());
        Ok(rx)
    }
}

/// Everything one fit needs, owned so it can run on its own task.
struct FitJob {
    plan:    TrainingPlan,
    encoder: TextEncoder,
    policy:  DecisionPolicy,
    timeout: Option<Duration>,
}

impl FitJob {
    async fn run(self) -> Result<Arc<dyn SentimentModel>> {
        let plan = &self.plan;
        tracing::info!("No model loaded, training from '{}'", plan.dataset_path.display());
        let raw     = plan.loader.load_file(&plan.dataset_path).await?;
        let dataset = SentimentDataset::encode(&raw, &self.encoder);

        let trainer = Arc::clone(&plan.trainer);
        let task    = tokio::task::spawn_blocking(move || trainer.fit(&dataset));

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                tracing::warn!("Training did not finish within {:?}", limit);
                SentimentError::TrainingTimeout(limit)
            })?,
            None => task.await,
        };
        let model = joined
            .map_err(|e| SentimentError::TrainingFailed(format!("training task failed: {e}")))??;

        check_compatible(self.encoder.config(), &self.policy, model.as_ref())?;
        tracing::info!("Model trained and ready");
        Ok(model)
    }
}

fn check_compatible(
    encoder: &EncoderConfig,
    policy:  &DecisionPolicy,
    model:   &dyn SentimentModel,
) -> Result<()> {
    if model.encoder_config() != encoder {
        tracing::error!(
            "Encoder mismatch: model {:?}, engine {:?}",
            model.encoder_config(),
            encoder
        );
        return Err(SentimentError::ConfigMismatch {
            model:  format!("{:?}", model.encoder_config()),
            engine: format!("{:?}", encoder),
        });
    }

    let policy_fits = match policy {
        DecisionPolicy::Argmax(label_set) => *label_set == model.label_set(),
        DecisionPolicy::Thresholds(_)     => model.label_set() == LabelSet::Binary,
    };
    if !policy_fits {
        return Err(SentimentError::InvalidConfig(format!(
            "decision policy {:?} cannot read output of a {:?} model",
            policy,
            model.label_set()
        )));
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::decision::ThresholdTable;
    use crate::domain::traits::ModelOutput;
    use crate::ml::trainer::{TrainConfig, Trainer};

    struct FixedModel {
        encoder: EncoderConfig,
        output:  ModelOutput,
    }

    impl SentimentModel for FixedModel {
        fn encoder_config(&self) -> &EncoderConfig { &self.encoder }

        fn label_set(&self) -> LabelSet {
            match self.output {
                ModelOutput::Probability(_) => LabelSet::Binary,
                ModelOutput::Scores(_)      => LabelSet::Ternary,
            }
        }

        fn score(&self, _features: &[f32]) -> Result<ModelOutput> {
            Ok(self.output.clone())
        }
    }

    /// Fails on the all-padding vector, scores everything else Positive.
    struct PaddingRejectingModel {
        encoder: EncoderConfig,
    }

    impl SentimentModel for PaddingRejectingModel {
        fn encoder_config(&self) -> &EncoderConfig { &self.encoder }

        fn label_set(&self) -> LabelSet { LabelSet::Ternary }

        fn score(&self, features: &[f32]) -> Result<ModelOutput> {
            if features.iter().all(|&x| x == 0.0) {
                return Err(SentimentError::Inference("nothing to score".to_string()));
            }
            Ok(ModelOutput::Scores(vec![0.1, 0.1, 0.8]))
        }
    }

    /// Counts fits; sleeps so concurrent callers overlap.
    struct CountingTrainer {
        fits:    AtomicUsize,
        delay:   Duration,
        fail:    bool,
        encoder: EncoderConfig,
    }

    impl CountingTrainer {
        fn new(delay: Duration) -> Self {
            Self { fits: AtomicUsize::new(0), delay, fail: false, encoder: encoder_config() }
        }
    }

    impl ModelTrainer for CountingTrainer {
        fn fit(&self, _dataset: &SentimentDataset) -> Result<Arc<dyn SentimentModel>> {
            let n = self.fits.fetch_add(1, Ordering::SeqCst) + 1;
            std::thread::sleep(self.delay);
            if self.fail {
                return Err(SentimentError::TrainingFailed(format!("stub failure #{n}")));
            }
            // scores differ per fit, so two fits would be observable
            let positive = if n == 1 { 0.8 } else { 0.0 };
            Ok(Arc::new(FixedModel {
                encoder: self.encoder,
                output:  ModelOutput::Scores(vec![0.1, 0.2 - positive / 10.0, positive]),
            }))
        }
    }

    fn encoder_config() -> EncoderConfig {
        EncoderConfig::new(10)
    }

    fn ternary_engine() -> InferenceEngine {
        InferenceEngine::new(encoder_config(), DecisionPolicy::Argmax(LabelSet::Ternary)).unwrap()
    }

    fn write_dataset(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("train.csv");
        std::fs::write(
            &path,
            "1,i love this,love,positive\n2,i hate this,hate,negative\n3,it is fine,fine,neutral\n",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_no_model_and_no_plan() {
        let engine = ternary_engine();
        let err = engine.predict("hello").await.unwrap_err();
        assert!(matches!(err, SentimentError::ModelNotLoaded));
        assert!(!engine.is_trained());
    }

    #[tokio::test]
    async fn test_preloaded_model_predicts_without_training() {
        let model = Arc::new(FixedModel {
            encoder: encoder_config(),
            output:  ModelOutput::Probability(0.2),
        });
        let policy = DecisionPolicy::Thresholds(ThresholdTable::default());
        let engine = InferenceEngine::new(encoder_config(), policy)
            .unwrap()
            .with_model(model)
            .unwrap();

        assert!(engine.is_trained());
        assert_eq!(engine.predict("").await.unwrap(), Category::Negative);
    }

    #[tokio::test]
    async fn test_mismatched_encoder_is_rejected() {
        let model = Arc::new(FixedModel {
            encoder: EncoderConfig::new(12),
            output:  ModelOutput::Scores(vec![1.0, 0.0, 0.0]),
        });
        let err = ternary_engine().with_model(model).err().unwrap();
        assert!(matches!(err, SentimentError::ConfigMismatch { .. }));
    }

    #[tokio::test]
    async fn test_policy_must_fit_label_set() {
        let model = Arc::new(FixedModel {
            encoder: encoder_config(),
            output:  ModelOutput::Scores(vec![1.0, 0.0, 0.0]),
        });
        let policy = DecisionPolicy::Thresholds(ThresholdTable::default());
        let engine = InferenceEngine::new(encoder_config(), policy).unwrap();
        assert!(matches!(engine.with_model(model), Err(SentimentError::InvalidConfig(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_predicts_share_one_fit() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer::new(Duration::from_millis(100)));
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer.clone()));

        let (a, b) = tokio::join!(engine.predict("i love this"), engine.predict("whatever"));

        assert_eq!(trainer.fits.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), Category::Positive);
        assert_eq!(b.unwrap(), Category::Positive);

        let first  = engine.model().await.unwrap();
        let second = engine.model().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fit_publishes_nothing_and_can_retry() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer { fail: true, ..CountingTrainer::new(Duration::ZERO) });
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer.clone()));

        assert!(matches!(engine.predict("x").await, Err(SentimentError::TrainingFailed(_))));
        assert!(!engine.is_trained());

        assert!(engine.predict("x").await.is_err());
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failed_fit() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer {
            fail: true,
            ..CountingTrainer::new(Duration::from_millis(50))
        });
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer.clone()));

        let (a, b) = tokio::join!(engine.predict("x"), engine.predict("y"));
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 1);
        for result in [a, b] {
            match result {
                Err(SentimentError::TrainingFailed(msg)) => assert_eq!(msg, "stub failure #1"),
                other => panic!("expected the shared failure, got {other:?}"),
            }
        }
        assert!(!engine.is_trained());

        // a later call starts over
        assert!(engine.predict("z").await.is_err());
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_timeout() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer::new(Duration::from_millis(300)));
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer.clone()))
            .with_fit_timeout(Duration::from_millis(20));

        let (a, b) = tokio::join!(engine.predict("x"), engine.predict("y"));
        assert!(matches!(a, Err(SentimentError::TrainingTimeout(_))));
        assert!(matches!(b, Err(SentimentError::TrainingTimeout(_))));
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_start_second_fit() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer::new(Duration::from_millis(100)));
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer.clone()));

        let gave_up = tokio::time::timeout(Duration::from_millis(10), engine.predict("x")).await;
        assert!(gave_up.is_err());

        assert_eq!(engine.predict("i love this").await.unwrap(), Category::Positive);
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inference_error_keeps_trained_model() {
        let model: Arc<dyn SentimentModel> =
            Arc::new(PaddingRejectingModel { encoder: encoder_config() });
        let engine = ternary_engine().with_model(Arc::clone(&model)).unwrap();

        assert!(matches!(engine.predict("").await, Err(SentimentError::Inference(_))));
        assert!(engine.is_trained());
        assert_eq!(engine.predict("hello").await.unwrap(), Category::Positive);
        assert!(Arc::ptr_eq(&engine.model().await.unwrap(), &model));
    }

    #[tokio::test]
    async fn test_fit_timeout() {
        let dir     = tempfile::tempdir().unwrap();
        let trainer = Arc::new(CountingTrainer::new(Duration::from_millis(500)));
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer))
            .with_fit_timeout(Duration::from_millis(20));

        let err = engine.predict("i love this").await.unwrap_err();
        assert!(matches!(err, SentimentError::TrainingTimeout(_)));
        assert!(!engine.is_trained());
    }

    #[tokio::test]
    async fn test_missing_dataset_surfaces_io_error() {
        let trainer = Arc::new(CountingTrainer::new(Duration::ZERO));
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new("/definitely/not/here.csv", trainer.clone()));

        assert!(matches!(engine.predict("x").await, Err(SentimentError::Io(_))));
        assert_eq!(trainer.fits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_end_to_end_three_records() {
        let dir     = tempfile::tempdir().unwrap();
        let config  = TrainConfig {
            batch_size:    3,
            epochs:        300,
            learning_rate: 0.05,
            hidden_size:   16,
            label_set:     LabelSet::Ternary,
        };
        let trainer = Arc::new(Trainer::new(config, encoder_config()).unwrap());
        let engine  = ternary_engine()
            .with_training(TrainingPlan::new(write_dataset(&dir), trainer));

        assert_eq!(engine.predict("i love this").await.unwrap(), Category::Positive);
        assert!(engine.is_trained());
    }
}
