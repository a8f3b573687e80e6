// ============================================================
// Layer 4 — Encoded Dataset
// ============================================================
// The hand-off point between the data pipeline and the model:
// each sample is a natural-length index sequence plus a label.
// Padding is NOT applied here; the batcher pads every batch to
// its own longest sequence.

use serde::{Deserialize, Serialize};

use crate::data::{vocabulary::Vocabulary, DataError};
use crate::domain::document::class_count;

/// One encoded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub indices: Vec<usize>,
    pub label:   usize,
}

impl EncodedSample {
    pub fn new(indices: Vec<usize>, label: usize) -> Self {
        Self { indices, label }
    }
}

#[derive(Debug, Clone)]
pub struct EncodedDataset {
    samples:       Vec<EncodedSample>,
    padding_index: usize,
}

impl EncodedDataset {
    pub fn new(samples: Vec<EncodedSample>, padding_index: usize) -> Self {
        Self { samples, padding_index }
    }

    /// Encode tokenised documents with their labels. Fails on the
    /// first token the vocabulary does not know.
    pub fn encode(
        documents: &[Vec<String>],
        labels:    &[usize],
        vocab:     &Vocabulary,
    ) -> Result<Self, DataError> {
        if documents.len() != labels.len() {
            return Err(DataError::LengthMismatch {
                documents: documents.len(),
                labels:    labels.len(),
            });
        }

        let samples = documents
            .iter()
            .zip(labels)
            .map(|(doc, &label)| -> Result<EncodedSample, DataError> {
                Ok(EncodedSample::new(vocab.encode(doc)?, label))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(samples, vocab.padding_index()))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn padding_index(&self) -> usize {
        self.padding_index
    }

    pub fn samples(&self) -> &[EncodedSample] {
        &self.samples
    }

    /// Borrow the samples at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Vec<&EncodedSample> {
        indices.iter().map(|&i| &self.samples[i]).collect()
    }

    /// `max(label) + 1` over the whole dataset.
    pub fn num_classes(&self) -> usize {
        class_count(self.samples.iter().map(|s| s.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_documents() {
        let vocab = Vocabulary::from_tokens(["good", "bad"]);
        let docs = vec![doc(&["good"]), doc(&["bad", "good"])];
        let ds = EncodedDataset::encode(&docs, &[0, 1], &vocab).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.padding_index(), 2);
        assert_eq!(ds.samples()[1], EncodedSample::new(vec![1, 0], 1));
        assert_eq!(ds.num_classes(), 2);
    }

    #[test]
    fn test_label_count_must_match() {
        let vocab = Vocabulary::from_tokens(["good"]);
        let err = EncodedDataset::encode(&[doc(&["good"])], &[], &vocab).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { documents: 1, labels: 0 }));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let ds = EncodedDataset::new(
            (0..4).map(|i| EncodedSample::new(vec![i], i)).collect(),
            9,
        );
        let picked: Vec<usize> = ds.select(&[3, 0]).iter().map(|s| s.label).collect();
        assert_eq!(picked, vec![3, 0]);
    }
}
