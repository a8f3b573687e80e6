// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one row per epoch to `metrics.csv` in the checkpoint
// directory.
//
//   epoch,train_loss,val_loss,val_acc
//   1,0.693120,0.690004,0.500000
//   2,0.652871,,
//
// Validation columns stay empty when the run has no validation
// split. A fresh run starts the file over; a resumed run keeps
// adding rows below the previous ones.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

const METRICS_FILE: &str = "metrics.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean cross-entropy over the epoch's training batches
    pub train_loss: f64,

    /// Mean cross-entropy on the held-out split
    pub val_loss: Option<f64>,

    /// Fraction of held-out samples classified correctly, in [0, 1]
    #[serde(rename = "val_acc")]
    pub val_accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss: None, val_accuracy: None }
    }

    pub fn with_validation(mut self, loss: f64, accuracy: f64) -> Self {
        self.val_loss = Some(loss);
        self.val_accuracy = Some(accuracy);
        self
    }

    /// True if this epoch's validation loss beats `best_val_loss`.
    /// Epochs without validation never count as an improvement.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss.is_some_and(|loss| loss < best_val_loss)
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Keeps existing rows; writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let csv_path = Self::prepare(dir.as_ref())?;
        if !csv_path.exists() {
            Self::write_header(&csv_path)?;
        }
        Ok(Self { csv_path })
    }

    /// Discards any rows from an earlier run and writes a fresh header.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let csv_path = Self::prepare(dir.as_ref())?;
        Self::write_header(&csv_path)?;
        Ok(Self { csv_path })
    }

    fn prepare(dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(dir.join(METRICS_FILE))
    }

    fn write_header(csv_path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writer.write_record(["epoch", "train_loss", "val_loss", "val_acc"])?;
        writer.flush()?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        Ok(())
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        let optional = |v: Option<f64>| v.map(|v| format!("{v:.6}")).unwrap_or_default();
        writer.write_record([
            m.epoch.to_string(),
            format!("{:.6}", m.train_loss),
            optional(m.val_loss),
            optional(m.val_accuracy),
        ])?;
        writer.flush()?;

        tracing::debug!("Logged epoch {} metrics: train_loss={:.4}", m.epoch, m.train_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
