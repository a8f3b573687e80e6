// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Maps each distinct lowercase token to a dense index.
//
// Layout:
//   0 .. n-1   real tokens
//   n          "<pad>", the padding index (always last)
//
// The padding index doubles as the row of zeros at the bottom
// of the weight matrix, so `len()` is also the number of rows
// the embedding table needs.
//
// Built once from the training corpus and never mutated. It is
// stored next to the checkpoint as a JSON object
// (`{"bad": 1, "good": 0, "<pad>": 2}`) so a later `predict`
// run encodes text exactly like training did.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::data::DataError;

/// Reserved token occupying the last index.
pub const PAD_TOKEN: &str = "<pad>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, usize>", into = "BTreeMap<String, usize>")]
pub struct Vocabulary {
    /// Index → token, padding token last
    tokens: Vec<String>,
    /// Token → index
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from tokens in the order given; duplicates keep their
    /// first index. The padding token is appended.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();

        for token in tokens {
            let token = token.into();
            if token == PAD_TOKEN || index.contains_key(&token) {
                continue;
            }
            index.insert(token.clone(), ordered.len());
            ordered.push(token);
        }

        index.insert(PAD_TOKEN.to_string(), ordered.len());
        ordered.push(PAD_TOKEN.to_string());

        Self { tokens: ordered, index }
    }

    /// Collect every distinct token of the corpus. Tokens are sorted
    /// so the same corpus always produces the same indices.
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Vec<String>>,
    {
        let distinct: BTreeSet<&str> = documents
            .into_iter()
            .flat_map(|doc| doc.iter().map(String::as_str))
            .collect();
        Self::from_tokens(distinct)
    }

    /// Number of indices including the padding index.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when only the padding token is present.
    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    pub fn padding_index(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Real tokens with their indices, padding excluded.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.tokens[..self.padding_index()]
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.as_str()))
    }

    /// Encode a tokenised document. Every token must be known.
    pub fn encode(&self, tokens: &[String]) -> Result<Vec<usize>, DataError> {
        tokens
            .iter()
            .map(|t| {
                self.index_of(t)
                    .ok_or_else(|| DataError::UnknownToken(t.clone()))
            })
            .collect()
    }

    /// Encode, silently dropping tokens the vocabulary has never seen.
    pub fn encode_known(&self, tokens: &[String]) -> Vec<usize> {
        tokens.iter().filter_map(|t| self.index_of(t)).collect()
    }
}

impl TryFrom<HashMap<String, usize>> for Vocabulary {
    type Error = DataError;

    fn try_from(map: HashMap<String, usize>) -> Result<Self, Self::Error> {
        let mut slots: Vec<Option<String>> = vec![None; map.len()];
        for (token, i) in map {
            let Some(slot) = slots.get_mut(i) else {
                return Err(DataError::InvalidVocabulary(format!(
                    "index {i} of '{token}' is out of range"
                )));
            };
            if let Some(other) = slot {
                return Err(DataError::InvalidVocabulary(format!(
                    "index {i} assigned to both '{other}' and '{token}'"
                )));
            }
            *slot = Some(token);
        }

        let tokens: Vec<String> = slots.into_iter().flatten().collect();
        if tokens.last().map(String::as_str) != Some(PAD_TOKEN) {
            return Err(DataError::InvalidVocabulary(format!(
                "'{PAD_TOKEN}' must hold the last index"
            )));
        }

        Ok(Self::from_tokens(tokens))
    }
}

impl From<Vocabulary> for BTreeMap<String, usize> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.index.into_iter().collect()
    }
}
