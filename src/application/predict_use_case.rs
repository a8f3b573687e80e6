// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Classifies one raw string with a trained checkpoint:
//
//   text → Preprocessor → saved Vocabulary → Inferencer → class
//
// Text is filtered exactly like the training corpus was, and
// encoded with the vocabulary saved by `train`. By default a
// token the vocabulary has never seen is an error; with
// `skip_unknown` such tokens are dropped before encoding.

use anyhow::{Context, Result};

use crate::data::{preprocessor::Preprocessor, vocabulary::Vocabulary};
use crate::domain::{prediction::Prediction, traits::TextClassifier};
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabularyStore};
use crate::ml::backend::BackendKind;
use crate::ml::inferencer::LoadedClassifier;

#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub checkpoint_dir: String,
    pub backend:        BackendKind,
    pub accelerator:    bool,
    pub skip_unknown:   bool,
}

pub struct PredictUseCase {
    preprocessor: Preprocessor,
    vocab:        Vocabulary,
    classifier:   LoadedClassifier,
    skip_unknown: bool,
}

impl PredictUseCase {
    pub fn new(config: &PredictConfig) -> Result<Self> {
        let vocab = VocabularyStore::new(&config.checkpoint_dir).load()?;
        let ckpt = CheckpointManager::open(&config.checkpoint_dir);
        let classifier = LoadedClassifier::load(&ckpt, config.backend, config.accelerator)?;

        Ok(Self {
            preprocessor: Preprocessor::new(),
            vocab,
            classifier,
            skip_unknown: config.skip_unknown,
        })
    }

    /// Vocabulary indices for `text`, following the unknown-token policy.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        let tokens = self.preprocessor.filter_text(text);
        tracing::debug!("Tokens: {:?}", tokens);

        if self.skip_unknown {
            let indices = self.vocab.encode_known(&tokens);
            if indices.len() < tokens.len() {
                tracing::warn!(
                    "Skipped {} of {} tokens not seen during training",
                    tokens.len() - indices.len(),
                    tokens.len()
                );
            }
            Ok(indices)
        } else {
            self.vocab
                .encode(&tokens)
                .context("Pass --skip-unknown to ignore words the model was not trained on")
        }
    }
}

impl TextClassifier for PredictUseCase {
    fn classify(&self, text: &str) -> Result<Prediction> {
        let indices = self.encode(text)?;
        if indices.is_empty() {
            tracing::warn!("No known tokens in input; the prediction reflects padding only");
        }
        self.classifier.predict(&indices)
    }
}
