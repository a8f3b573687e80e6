// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads the labelled corpus. The file needs a header row with
// at least a `content` and a `label` column; any other columns
// are ignored.
//
//   id,content,label
//   1,"@bob loving this weather",1
//   2,"worst commute ever",0
//
// A row that cannot be parsed (missing field, non-integer
// label) fails the whole load: training on a silently
// shortened corpus is worse than not training.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{io::Read, path::PathBuf};

use crate::data::DataError;
use crate::domain::{document::LabeledDocument, traits::DocumentSource};

#[derive(Debug, Deserialize)]
struct CsvRow {
    content: String,
    label:   usize,
}

/// Loads `LabeledDocument`s from a CSV file.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse CSV from any reader. Split out so tests need no files.
    pub fn read_from<R: Read>(reader: R) -> Result<Vec<LabeledDocument>, DataError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        rdr.deserialize::<CsvRow>()
            .map(|row| -> Result<LabeledDocument, DataError> {
                let row = row?;
                Ok(LabeledDocument::new(row.content, row.label))
            })
            .collect()
    }
}

impl DocumentSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<LabeledDocument>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Cannot open dataset '{}'", self.path.display()))?;
        let docs = Self::read_from(file)
            .with_context(|| format!("Cannot parse dataset '{}'", self.path.display()))?;

        if docs.is_empty() {
            return Err(DataError::EmptyCorpus)
                .with_context(|| format!("'{}' has a header but no rows", self.path.display()));
        }

        tracing::info!("Loaded {} labelled documents from '{}'", docs.len(), self.path.display());
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_content_and_label_ignoring_extra_columns() {
        let csv = "id,content,label\n1,\"hello, world\",1\n2,bye,0\n";
        let docs = CsvLoader::read_from(csv.as_bytes()).unwrap();
        assert_eq!(
            docs,
            vec![LabeledDocument::new("hello, world", 1), LabeledDocument::new("bye", 0)]
        );
    }

    #[test]
    fn test_bad_label_is_an_error() {
        let csv = "content,label\nhello,positive\n";
        assert!(CsvLoader::read_from(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_all_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content,label\ngreat day,1\nawful day,0").unwrap();

        let docs = CsvLoader::new(file.path()).load_all().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].label, 0);
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "content,label").unwrap();
        assert!(CsvLoader::new(file.path()).load_all().is_err());
    }
}
