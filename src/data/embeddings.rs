// ============================================================
// Layer 4 — Pretrained Weight Matrix
// ============================================================
// Builds the embedding table the classifier is initialised
// with, one row per vocabulary index.
//
// Source format (GloVe text files):
//   the 0.418 0.24968 -0.41242 ...
//   , 0.013441 0.23682 -0.16899 ...
//
// Row assignment:
//   token found in the file    → that vector
//   token missing from file    → uniform random in [0, 1)
//   padding index (last row)   → all zeros
//
// Only vocabulary tokens are kept, so a 400k-line file does
// not end up in memory. Every line is still checked for a
// consistent dimension so a truncated download fails loudly.

use rand::Rng;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::{vocabulary::Vocabulary, DataError};

/// Row-major `rows × dim` matrix of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    data: Vec<f32>,
    rows: usize,
    dim:  usize,
}

impl WeightMatrix {
    /// All-zero matrix, used as a placeholder before a checkpoint
    /// overwrites the embedding table.
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self { data: vec![0.0; rows * dim], rows, dim }
    }

    /// Build from explicit rows; all rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, DataError> {
        let dim = rows.first().map(Vec::len).ok_or(DataError::EmptyEmbeddings)?;
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(DataError::DimensionMismatch {
                    line: i + 1,
                    expected: dim,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { data, rows: rows.len(), dim })
    }

    /// Read a GloVe file and align it with `vocab`.
    pub fn from_glove_file(path: impl AsRef<Path>, vocab: &Vocabulary) -> Result<Self, DataError> {
        let file = File::open(path.as_ref())?;
        Self::from_glove_reader(BufReader::new(file), vocab, &mut rand::thread_rng())
    }

    /// Same as `from_glove_file` over any buffered reader, with the
    /// random source for missing tokens supplied by the caller.
    pub fn from_glove_reader<R, G>(reader: R, vocab: &Vocabulary, rng: &mut G) -> Result<Self, DataError>
    where
        R: BufRead,
        G: Rng,
    {
        let mut dim: Option<usize> = None;
        let mut found: Vec<Option<Vec<f32>>> = vec![None; vocab.len()];

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(token) = parts.next() else { continue };
            let values: Vec<&str> = parts.collect();

            let expected = *dim.get_or_insert(values.len());
            if values.len() != expected {
                return Err(DataError::DimensionMismatch {
                    line: line_no + 1,
                    expected,
                    found: values.len(),
                });
            }

            let Some(index) = vocab.index_of(token) else { continue };
            if index == vocab.padding_index() || found[index].is_some() {
                continue;
            }

            let vector = values
                .iter()
                .map(|v| {
                    v.parse::<f32>().map_err(|_| DataError::InvalidNumber {
                        line: line_no + 1,
                        value: v.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;
            found[index] = Some(vector);
        }

        let dim = match dim {
            Some(d) if d > 0 => d,
            _ => return Err(DataError::EmptyEmbeddings),
        };

        let pad = vocab.padding_index();
        let mut data = Vec::with_capacity(vocab.len() * dim);
        let mut missing = 0usize;
        for (index, vector) in found.into_iter().enumerate() {
            match vector {
                _ if index == pad => data.extend(std::iter::repeat(0.0).take(dim)),
                Some(v) => data.extend(v),
                None => {
                    missing += 1;
                    data.extend((0..dim).map(|_| rng.gen::<f32>()));
                }
            }
        }

        tracing::info!(
            "Embedding table: {} rows × {} dims ({} tokens had no pretrained vector)",
            vocab.len(),
            dim,
            missing
        );

        Ok(Self { data, rows: vocab.len(), dim })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    /// Flat row-major view, ready for `TensorData::new`.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
