// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the CSV on disk and the integer tensors
// the classifier consumes.
//
//   data.csv  ──► CsvLoader        → LabeledDocument { content, label }
//                     │
//                     ▼
//                 Preprocessor     → lowercase word tokens
//                     │
//                     ▼
//                 Vocabulary       → token → index (+ <pad> at the end)
//                     │
//   glove.txt ──► WeightMatrix     → one vector per vocabulary index
//                     │
//                     ▼
//                 EncodedDataset   → index sequences + labels
//                     │
//                     ▼
//                 ClassificationBatcher → right-padded Int tensors
//
// Reference: Rust Book §13 (Iterators and Closures)

use thiserror::Error;

/// Reads the `content,label` CSV corpus
pub mod loader;

/// Strips handles, punctuation and case from raw text
pub mod preprocessor;

/// Token ↔ index map with a reserved padding index
pub mod vocabulary;

/// Pretrained word-vector matrix aligned with the vocabulary
pub mod embeddings;

/// Encoded samples and the dataset that owns them
pub mod dataset;

/// Padding and tensor batching
pub mod batcher;

/// Train/validation split
pub mod splitter;

/// Failures of the data pipeline. Everything here is fatal for
/// the run; callers wrap it in `anyhow` with file context.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("token '{0}' is not in the vocabulary")]
    UnknownToken(String),

    #[error("the corpus contains no documents")]
    EmptyCorpus,

    #[error("{documents} documents but {labels} labels")]
    LengthMismatch { documents: usize, labels: usize },

    #[error("embedding source is empty")]
    EmptyEmbeddings,

    #[error("embedding line {line}: expected {expected} components, found {found}")]
    DimensionMismatch { line: usize, expected: usize, found: usize },

    #[error("embedding line {line}: '{value}' is not a number")]
    InvalidNumber { line: usize, value: String },

    #[error("vocabulary is malformed: {0}")]
    InvalidVocabulary(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
