// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Turns a slice of encoded samples into Int tensors.
//
// Documents have different natural lengths, so every batch is
// right-padded to the length of its own longest document:
//
//   [4, 7]        →  [4, 7, P, P]
//   [1, 2, 3, 9]  →  [1, 2, 3, 9]      (P = padding index)
//
// Tensors are created on the batcher's device, normally the
// host; the device adapter moves them to the accelerator for
// the duration of a training step.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;

use crate::data::dataset::EncodedSample;

/// Right-pad every sequence to the longest one. The result always
/// has at least one column, so an all-empty batch becomes a single
/// column of padding.
pub fn pad_sequences(sequences: &[&[usize]], padding_index: usize) -> Vec<Vec<usize>> {
    let width = sequences.iter().map(|s| s.len()).max().unwrap_or(0).max(1);
    sequences
        .iter()
        .map(|s| {
            let mut padded = Vec::with_capacity(width);
            padded.extend_from_slice(s);
            padded.resize(width, padding_index);
            padded
        })
        .collect()
}

// ─── ClassificationBatch ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Padded index sequences: shape: [batch_size, seq_len]
    pub inputs: Tensor<B, 2, Int>,

    /// Class ids: shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── ClassificationBatcher ────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    device:        B::Device,
    padding_index: usize,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device, padding_index: usize) -> Self {
        Self { device, padding_index }
    }

    /// Pad and stack index sequences into a `[batch, seq_len]` tensor.
    pub fn inputs(&self, sequences: &[&[usize]]) -> Tensor<B, 2, Int> {
        let padded = pad_sequences(sequences, self.padding_index);
        let batch_size = padded.len();
        let seq_len = padded.first().map_or(1, Vec::len);

        // Vec<Vec<usize>> → flat Vec<i32>, reshaped back to [batch, seq]
        let flat: Vec<i32> = padded
            .iter()
            .flat_map(|row| row.iter().map(|&i| i as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }

    pub fn batch(&self, items: &[&EncodedSample]) -> ClassificationBatch<B> {
        let sequences: Vec<&[usize]> = items.iter().map(|s| s.indices.as_slice()).collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label as i32).collect();

        ClassificationBatch {
            inputs:  self.inputs(&sequences),
            targets: Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_padding_fills_tail_and_equalises_length() {
        let docs: Vec<Vec<usize>> = vec![vec![4, 7], vec![1, 2, 3, 9], vec![]];
        let refs: Vec<&[usize]> = docs.iter().map(Vec::as_slice).collect();
        let padded = pad_sequences(&refs, 5);

        assert!(padded.iter().all(|row| row.len() == 4));
        for (orig, row) in docs.iter().zip(&padded) {
            assert_eq!(&row[..orig.len()], orig.as_slice());
            assert!(row[orig.len()..].iter().all(|&i| i == 5));
        }
    }

    #[test]
    fn test_short_document_pads_to_batch_width() {
        let padded = pad_sequences(&[&[0], &[1, 0, 1]], 2);
        assert_eq!(padded[0], vec![0, 2, 2]);
    }

    #[test]
    fn test_all_empty_batch_gets_one_column() {
        let padded = pad_sequences(&[&[], &[]], 3);
        assert_eq!(padded, vec![vec![3], vec![3]]);
    }

    #[test]
    fn test_batch_shapes_and_values() {
        let batcher = ClassificationBatcher::<TestBackend>::new(Default::default(), 2);
        let a = EncodedSample::new(vec![0], 0);
        let b = EncodedSample::new(vec![1, 1, 0], 1);
        let batch = batcher.batch(&[&a, &b]);

        assert_eq!(batch.inputs.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let inputs: Vec<i64> = batch
            .inputs
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(inputs, vec![0, 2, 2, 1, 1, 0]);
    }
}
