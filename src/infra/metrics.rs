// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:    the epoch number (1, 2, 3, ...)
//   - loss:     mean batch loss over the epoch
//   - accuracy: fraction of training samples predicted correctly
//               while the epoch was running
//   - samples:  number of samples trained on
//
// Output file: <model_dir>/metrics.csv
//
//   epoch,loss,accuracy,samples
//   1,1.098612,0.333333,3
//   2,1.031544,0.666667,3
//
// The file is appended to, so several runs into the same
// directory keep their history.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:    usize,
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, accuracy: f64, samples: usize) -> Self {
        Self { epoch, loss, accuracy, samples }
    }
}

/// Appends epoch metrics to a CSV file.
#[derive(Debug, Clone)]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Creates the directory, and the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,loss,accuracy,samples")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6},{}", m.epoch, m.loss, m.accuracy, m.samples)?;

        tracing::debug!("Logged epoch {} metrics: loss={:.4}", m.epoch, m.loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
