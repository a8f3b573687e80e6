// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so a CSV
// file, a database table or an in-memory fixture can all feed
// training, and any trained model can answer `classify`.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::{document::LabeledDocument, prediction::Prediction};

// ─── DocumentSource ───────────────────────────────────────────────────────────
/// Anything that can produce the labelled training corpus.
///
/// Implementations:
///   - CsvLoader → `content,label` CSV file
pub trait DocumentSource {
    /// Load every labelled document, in source order.
    fn load_all(&self) -> Result<Vec<LabeledDocument>>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// Anything that can assign a class to one raw string.
///
/// Implementations:
///   - PredictUseCase → trained GRU classifier loaded from a checkpoint
pub trait TextClassifier {
    fn classify(&self, text: &str) -> Result<Prediction>;
}
