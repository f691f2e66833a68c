// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to
// Layer 2. Printing happens here and nowhere else.
//
//   1. `train`   — trains on a CSV file and saves the model
//   2. `predict` — classifies one text with a saved model, or
//                  trains on a CSV first when given --dataset
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::{predict_use_case::PredictUseCase, train_use_case::TrainUseCase};
use crate::data::loader::CsvLoader;

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-classifier",
    version,
    about = "Train a hash-encoded sentiment classifier on CSV data, then classify text."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args).await,
            Commands::Predict(args) => run_predict(args).await,
        }
    }
}

async fn run_train(args: TrainArgs) -> Result<()> {
    let config = args.config.resolve()?;
    tracing::info!("Starting training on '{}'", args.dataset.display());

    let use_case = TrainUseCase::new(config, &args.dataset, &args.model_dir)?
        .with_loader(CsvLoader::new().with_header(args.header));
    use_case.execute().await?;

    println!("Training complete. Model saved to '{}'.", use_case.model_dir().display());
    Ok(())
}

async fn run_predict(args: PredictArgs) -> Result<()> {
    args.check_overrides()?;
    let use_case = match (&args.model_dir, &args.dataset) {
        (Some(dir), None) => {
            let config = if args.config.is_explicit() {
                Some(args.config.resolve()?)
            } else {
                None
            };
            PredictUseCase::from_model_dir(dir, config)?
        }
        (None, Some(dataset)) => {
            PredictUseCase::from_dataset(dataset, args.config.resolve()?, args.header)?
        }
        _ => bail!("predict needs exactly one of --model-dir or --dataset"),
    };

    let category = use_case.predict(&args.text).await?;
    println!("{category}");
    Ok(())
}
