// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns the on-disk layout of one training run.
//
//   checkpoints/
//     model.mpk                ← parameter snapshot
//     classifier_config.json   ← architecture, rebuilt before loading
//     train_config.json        ← the run's TrainConfig
//     vocabulary.json          ← token → index map (vocab_store.rs)
//     metrics.csv              ← per-epoch metrics (metrics.rs)
//
// Weights go through Burn's NamedMpkFileRecorder at full
// precision so a save → load round trip reproduces forward
// outputs exactly. The recorder appends ".mpk" itself, so paths
// handed to it carry no extension.
//
// A missing snapshot is not an error: `load_module` returns
// `None` and the caller keeps its freshly initialised weights.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::classifier::SequenceClassifierConfig;

const MODEL_FILE:      &str = "model";
const CLASSIFIER_FILE: &str = "classifier_config.json";
const TRAIN_FILE:      &str = "train_config.json";

type SnapshotRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Write every parameter of `module` to `path` (extension added by
/// the recorder), creating the parent directory when needed.
pub fn save_module<B: Backend, M: Module<B>>(module: &M, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", parent.display()))?;
    }

    SnapshotRecorder::new()
        .record(module.clone().into_record(), path.to_path_buf())
        .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

    tracing::debug!("Saved parameters to '{}'", path.display());
    Ok(())
}

/// Load the snapshot at `path` into `module`. Returns `None`
/// when no snapshot exists; `module` is dropped untouched.
pub fn load_module<B: Backend, M: Module<B>>(
    module: M,
    path:   &Path,
    device: &B::Device,
) -> Result<Option<M>> {
    let file = snapshot_file(path);
    if !file.exists() {
        tracing::debug!("No checkpoint at '{}'", file.display());
        return Ok(None);
    }

    let record = SnapshotRecorder::new()
        .load(path.to_path_buf(), device)
        .with_context(|| {
            format!("Cannot load checkpoint '{}'. Does it match this architecture?", file.display())
        })?;

    tracing::info!("Loaded parameters from '{}'", file.display());
    Ok(Some(module.load_record(record)))
}

/// The file the recorder actually writes for `path`.
pub fn snapshot_file(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}

/// Manages the files of one checkpoint directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Open an existing directory without creating it; used by `predict`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path without extension, as `save_module` expects.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn has_model(&self) -> bool {
        snapshot_file(&self.model_path()).exists()
    }

    pub fn save_classifier_config(&self, cfg: &SequenceClassifierConfig) -> Result<()> {
        self.write_json(CLASSIFIER_FILE, cfg)
    }

    pub fn load_classifier_config(&self) -> Result<SequenceClassifierConfig> {
        self.read_json(CLASSIFIER_FILE)
    }

    pub fn save_train_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_FILE, cfg)
    }

    pub fn load_train_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_FILE)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read '{}'. Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;
        serde_json::from_str(&json).with_context(|| format!("Malformed '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().join("run")).unwrap();
        let cfg = SequenceClassifierConfig::new(3, 4, 2).with_hidden_size(16);

        ckpt.save_classifier_config(&cfg).unwrap();
        let back = ckpt.load_classifier_config().unwrap();

        assert_eq!(back.vocab_size, 3);
        assert_eq!(back.embedding_dim, 4);
        assert_eq!(back.num_classes, 2);
        assert_eq!(back.hidden_size, 16);
    }

    #[test]
    fn test_missing_config_mentions_train() {
        let tmp = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::open(tmp.path());
        let err = ckpt.load_train_config().unwrap_err();
        assert!(format!("{err:#}").contains("train"));
    }

    #[test]
    fn test_snapshot_file_adds_extension() {
        let ckpt = CheckpointManager::open("checkpoints");
        assert_eq!(snapshot_file(&ckpt.model_path()), PathBuf::from("checkpoints/model.mpk"));
        assert!(!ckpt.has_model());
    }
}
