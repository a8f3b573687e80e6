// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory:
//
//   checkpoint.rs   - parameter snapshots (Burn recorder) and
//                     the JSON configs needed to rebuild the
//                     classifier before loading them
//
//   vocab_store.rs  - vocabulary.json, so `predict` encodes
//                     text with the indices training used
//
//   metrics.rs      - per-epoch metrics appended to metrics.csv
//
// Other layers ask these types for paths and files instead of
// building them by hand, so the directory layout lives in one
// place.

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary persistence
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
