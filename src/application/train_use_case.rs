// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the labelled CSV         (Layer 4 - data)
//   Step 2: Filter text into tokens       (Layer 4 - data)
//   Step 3: Build / reuse vocabulary      (Layer 4 + 6)
//   Step 4: Align pretrained vectors      (Layer 4 - data)
//   Step 5: Encode documents              (Layer 4 - data)
//   Step 6: Split train/validation        (Layer 4 - data)
//   Step 7: Save config                   (Layer 6 - infra)
//   Step 8: Run training loop             (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::EncodedDataset,
    embeddings::WeightMatrix,
    loader::CsvLoader,
    preprocessor::Preprocessor,
    splitter::split_validation,
    vocabulary::Vocabulary,
};
use crate::domain::traits::DocumentSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabularyStore};
use crate::ml::backend::BackendKind;
use crate::ml::trainer::{run_training, TrainReport, TrainingInputs};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the checkpoint as train_config.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:           String,
    pub embeddings_path:     String,
    pub checkpoint_dir:      String,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub hidden_size:         usize,
    pub learning_rate:       f64,
    pub train_embedding:     bool,
    pub validation_fraction: f64,
    pub resume:              bool,
    pub backend:             BackendKind,
    /// Use the accelerator when the backend has one
    pub accelerator:         bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:           "data/train.csv".to_string(),
            embeddings_path:     "data/glove.6B.50d.txt".to_string(),
            checkpoint_dir:      "checkpoints".to_string(),
            batch_size:          50,
            epochs:              100,
            hidden_size:         64,
            learning_rate:       1e-3,
            train_embedding:     false,
            validation_fraction: 0.0,
            resume:              false,
            backend:             BackendKind::Wgpu,
            accelerator:         true,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;
        if cfg.batch_size == 0 || cfg.epochs == 0 {
            bail!("--batch-size and --epochs must both be at least 1");
        }

        // ── Step 1: Load the labelled corpus ─────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.data_path);
        let documents = CsvLoader::new(&cfg.data_path).load_all()?;

        // ── Step 2: Filter into lowercase word tokens ─────────────────────────
        let preprocessor = Preprocessor::new();
        let tokens = preprocessor.filter_all(documents.iter().map(|d| d.content.as_str()));
        let labels: Vec<usize> = documents.iter().map(|d| d.label).collect();

        // ── Step 3: Vocabulary ────────────────────────────────────────────────
        // A resumed run must keep the indices its snapshot was trained on.
        let vocab_store = VocabularyStore::new(&cfg.checkpoint_dir);
        let vocab = vocab_store.load_or_save(Vocabulary::from_documents(&tokens), cfg.resume)?;
        tracing::info!("Vocabulary: {} tokens + padding", vocab.len() - 1);

        // ── Step 4: Pretrained vectors, one row per vocabulary index ──────────
        let weights = WeightMatrix::from_glove_file(&cfg.embeddings_path, &vocab)
            .with_context(|| format!("Cannot load embeddings from '{}'", cfg.embeddings_path))?;

        // ── Step 5: Encode ────────────────────────────────────────────────────
        let dataset = EncodedDataset::encode(&tokens, &labels, &vocab)
            .context("Cannot encode the corpus with this vocabulary")?;
        let num_classes = dataset.num_classes();
        tracing::info!("Encoded {} documents into {} classes", dataset.len(), num_classes);

        // ── Step 6: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_validation(
            dataset.samples().to_vec(),
            cfg.validation_fraction,
            &mut rand::thread_rng(),
        );
        if train_samples.is_empty() {
            bail!(
                "validation fraction {} leaves no documents to train on",
                cfg.validation_fraction
            );
        }
        tracing::info!("Split: {} train, {} validation", train_samples.len(), val_samples.len());

        let train = EncodedDataset::new(train_samples, vocab.padding_index());
        let validation = (!val_samples.is_empty())
            .then(|| EncodedDataset::new(val_samples, vocab.padding_index()));

        // ── Step 7: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_train_config(cfg)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        let inputs = TrainingInputs {
            weights: &weights,
            num_classes,
            train: &train,
            validation: validation.as_ref(),
        };
        run_training(cfg, inputs, &ckpt_manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CORPUS: &str = "content,label\n\
                          \"@ann Good film!\",0\n\
                          \"good, GOOD film\",0\n\
                          \"bad film\",1\n\
                          \"so bad\",1\n";

    const GLOVE: &str = "good 1.0 0.0 1.0\nbad 0.0 1.0 0.0\nfilm 0.5 0.5 0.5\n";

    fn config(dir: &std::path::Path) -> TrainConfig {
        let data = dir.join("train.csv");
        let glove = dir.join("glove.txt");
        fs::write(&data, CORPUS).unwrap();
        fs::write(&glove, GLOVE).unwrap();

        TrainConfig {
            data_path: data.display().to_string(),
            embeddings_path: glove.display().to_string(),
            checkpoint_dir: dir.join("ckpt").display().to_string(),
            batch_size: 2,
            epochs: 2,
            hidden_size: 8,
            backend: BackendKind::NdArray,
            accelerator: false,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_pipeline_writes_every_checkpoint_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path());

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert!(report.final_loss.is_finite());

        let ckpt = CheckpointManager::open(&cfg.checkpoint_dir);
        assert!(ckpt.has_model());
        assert_eq!(ckpt.load_train_config().unwrap(), cfg);

        // good, bad, film, so + <pad>; "so" has no vector and gets a random row
        let vocab = VocabularyStore::new(&cfg.checkpoint_dir).load().unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(ckpt.load_classifier_config().unwrap().vocab_size, 5);
        assert_eq!(ckpt.load_classifier_config().unwrap().num_classes, 2);
    }

    #[test]
    fn test_full_validation_fraction_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { validation_fraction: 1.0, ..config(tmp.path()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_missing_dataset_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { data_path: "/nonexistent/train.csv".into(), ..config(tmp.path()) };
        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/train.csv"));
    }
}
