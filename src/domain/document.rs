// ============================================================
// Layer 3 — LabeledDocument
// ============================================================
// One row of the training corpus: the free-text content and
// the integer class it belongs to. Tokenisation and encoding
// happen later in the data layer; this type only carries what
// was read from disk.

use serde::{Deserialize, Serialize};

/// A raw text snippet with its ground-truth class id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledDocument {
    /// Free text exactly as it appeared in the source
    pub content: String,

    /// Non-negative class id
    pub label: usize,
}

impl LabeledDocument {
    pub fn new(content: impl Into<String>, label: usize) -> Self {
        Self { content: content.into(), label }
    }
}

/// Number of classes implied by a set of labels: `max(label) + 1`.
/// An empty slice has no classes.
pub fn class_count(labels: impl IntoIterator<Item = usize>) -> usize {
    labels.into_iter().max().map_or(0, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_count_is_max_label_plus_one() {
        assert_eq!(class_count([0, 3, 1]), 4);
        assert_eq!(class_count([0, 0]), 1);
    }

    #[test]
    fn test_class_count_empty() {
        assert_eq!(class_count(Vec::<usize>::new()), 0);
    }
}
