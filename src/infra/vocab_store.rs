// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the vocabulary next to the checkpoint so `predict`
// encodes text with exactly the indices training used.
// A model loaded with a different vocabulary would read the
// wrong embedding rows without any error, so inference always
// loads from here and never rebuilds from a corpus.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::vocabulary::Vocabulary;

const VOCAB_FILE: &str = "vocabulary.json";

pub struct VocabularyStore {
    dir: PathBuf,
}

impl VocabularyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(VOCAB_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        let json = serde_json::to_string_pretty(vocab)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write vocabulary to '{}'", path.display()))?;
        tracing::info!("Saved vocabulary ({} tokens) to '{}'", vocab.len(), path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let path = self.path();
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read vocabulary from '{}'. Have you run 'train' first?", path.display())
        })?;
        let vocab: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("Invalid vocabulary file '{}'", path.display()))?;
        tracing::debug!("Loaded vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }

    /// Reuse the stored vocabulary when resuming, otherwise save `fresh`.
    pub fn load_or_save(&self, fresh: Vocabulary, resume: bool) -> Result<Vocabulary> {
        if resume && self.exists() {
            tracing::info!("Reusing stored vocabulary for resumed run");
            self.load()
        } else {
            self.save(&fresh)?;
            Ok(fresh)
        }
    }
}
