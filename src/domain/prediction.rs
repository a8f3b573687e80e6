// ============================================================
// Layer 3 — Prediction
// ============================================================
// What the classifier hands back for a single snippet.

use serde::{Deserialize, Serialize};

/// The most probable class and the probability mass assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: usize,
    pub confidence: f32,
}

impl Prediction {
    /// Pick the arg-max of a probability vector.
    /// Returns `None` for an empty distribution.
    pub fn from_probabilities(probabilities: &[f32]) -> Option<Self> {
        probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<Self>, (label, p)| match best {
                Some(b) if b.confidence >= p => Some(b),
                _ => Some(Self { label, confidence: p }),
            })
    }
}
