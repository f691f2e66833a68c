// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their flags.
//
// Hyper-parameter flags are optional. Each one given on the
// command line overrides the same field of the --config file
// (or of the defaults when there is no file).
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;
use clap::{Args, Subcommand};

use crate::application::config::SentimentConfig;
use crate::data::encoder::FeatureScheme;
use crate::domain::sentiment::LabelSet;
use crate::error::{Result, SentimentError};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a classifier on a CSV dataset and save it
    Train(TrainArgs),

    /// Classify one text
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV file: id,text,selected_text,sentiment
    #[arg(long)]
    pub dataset: PathBuf,

    /// Directory to save the model, its config and metrics.csv
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Skip the first line of the dataset
    #[arg(long)]
    pub header: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// The text to classify
    #[arg(long)]
    pub text: String,

    /// Directory a model was trained into
    #[arg(long, conflicts_with = "dataset")]
    pub model_dir: Option<PathBuf>,

    /// Train on this CSV first instead of loading a saved model
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Skip the first line of the dataset
    #[arg(long, requires = "dataset")]
    pub header: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Config file plus per-field overrides, shared by both commands
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON SentimentConfig; missing sections use defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tokens kept per text; shorter texts are padded
    #[arg(long)]
    pub sequence_length: Option<usize>,

    /// Number of hash buckets
    #[arg(long)]
    pub vocab_size: Option<usize>,

    /// Feature layout: compact (one value per token) or one-hot
    #[arg(long, value_parser = parse_scheme)]
    pub scheme: Option<FeatureScheme>,

    /// Keep letter case when encoding
    #[arg(long)]
    pub keep_case: bool,

    /// binary (positive / negative) or ternary (adds neutral)
    #[arg(long, value_parser = parse_label_set)]
    pub label_set: Option<LabelSet>,

    /// Number of samples per gradient step
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Number of full passes through the training data
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    pub lr: Option<f64>,

    /// Width of the hidden layer
    #[arg(long)]
    pub hidden_size: Option<usize>,

    /// Give up waiting for training after this many seconds
    #[arg(long)]
    pub fit_timeout_secs: Option<u64>,
}

impl PredictArgs {
    /// A saved model fixes its own encoder and training settings,
    /// so those flags only make sense together with --dataset.
    pub fn check_overrides(&self) -> Result<()> {
        if self.model_dir.is_some() && self.config.has_model_overrides() {
            return Err(SentimentError::InvalidConfig(
                "encoder and training flags cannot change a saved model; \
                 drop them or use --dataset"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigArgs {
    /// Any encoder or training flag given on the command line.
    pub fn has_model_overrides(&self) -> bool {
        self.sequence_length.is_some()
            || self.vocab_size.is_some()
            || self.scheme.is_some()
            || self.keep_case
            || self.label_set.is_some()
            || self.batch_size.is_some()
            || self.epochs.is_some()
            || self.lr.is_some()
            || self.hidden_size.is_some()
            || self.fit_timeout_secs.is_some()
    }

    /// True when the user asked for a config rather than relying on
    /// whatever a model directory already holds.
    pub fn is_explicit(&self) -> bool {
        self.config.is_some()
    }

    /// Load the --config file (or defaults) and apply the overrides.
    pub fn resolve(&self) -> Result<SentimentConfig> {
        let mut config = match &self.config {
            Some(path) => SentimentConfig::from_file(path)?,
            None       => SentimentConfig::default(),
        };

        let enc = &mut config.encoder;
        if let Some(v) = self.sequence_length { enc.sequence_length = v; }
        if let Some(v) = self.vocab_size      { enc.vocab_size = v; }
        if let Some(v) = self.scheme          { enc.scheme = v; }
        if self.keep_case                     { enc.lowercase = false; }

        let train = &mut config.training;
        if let Some(v) = self.label_set   { train.label_set = v; }
        if let Some(v) = self.batch_size  { train.batch_size = v; }
        if let Some(v) = self.epochs      { train.epochs = v; }
        if let Some(v) = self.lr          { train.learning_rate = v; }
        if let Some(v) = self.hidden_size { train.hidden_size = v; }

        if self.fit_timeout_secs.is_some() {
            config.fit_timeout_secs = self.fit_timeout_secs;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_scheme(s: &str) -> std::result::Result<FeatureScheme, String> {
    match s {
        "compact"         => Ok(FeatureScheme::Compact),
        "one-hot" | "one_hot" => Ok(FeatureScheme::OneHot),
        other => Err(format!("unknown scheme '{other}', expected compact or one-hot")),
    }
}

fn parse_label_set(s: &str) -> std::result::Result<LabelSet, String> {
    match s {
        "binary"  => Ok(LabelSet::Binary),
        "ternary" => Ok(LabelSet::Ternary),
        other => Err(format!("unknown label set '{other}', expected binary or ternary")),
    }
}
