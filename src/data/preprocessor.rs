// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns a raw snippet (tweets, mostly) into the lowercase word
// tokens the vocabulary is built from.
//
// Filtering steps (applied in order):
//   1. Drop @handles (1-15 word characters after '@')
//   2. Newlines become spaces, apostrophes vanish ("don't" → "dont")
//   3. Every run of non-letters becomes a single separator
//   4. Split, drop empty pieces, lowercase
//
// Training and inference must both go through `filter_text`,
// otherwise the vocabulary lookups will not line up.

use once_cell::sync::Lazy;
use regex::Regex;

static HANDLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w{1,15}").expect("Failed to compile handle regex"));

static NON_ALPHA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z ]+").expect("Failed to compile alphabet regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Filter a raw snippet into lowercase alphabetic tokens.
    pub fn filter_text(&self, text: &str) -> Vec<String> {
        let without_handles = HANDLE_REGEX.replace_all(text, "");
        let flattened = without_handles.replace('\n', " ").replace('\'', "");

        NON_ALPHA_REGEX
            .replace_all(&flattened, " ")
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }

    /// Filter a whole corpus, preserving order.
    pub fn filter_all<'a, I>(&self, texts: I) -> Vec<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.filter_text(t)).collect()
    }
}
