//! Passage corpus loaded from a CSV file.
//!
//! Row `i` of the named column is passage `i`, the same position the index
//! stores its vector under. The corpus never changes after loading.

mod error;


pub use error::{CorpusError, CorpusResult};

use std::path::Path;
use std::sync::Arc;

use tracing::info;

/// Ordered, immutable passages.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    passages: Arc<[String]>,
}

impl Corpus {
    /// Reads every row's `column` value from a headed CSV file.
    ///
    /// Empty cells load as empty passages so row positions stay aligned with the index.
    pub fn load_csv(path: impl AsRef<Path>, column: &str) -> CorpusResult<Self> {
        let path = path.as_ref();
        let csv_err = |source| CorpusError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let column_idx = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| CorpusError::MissingColumn {
                column: column.to_string(),
                available: headers.iter().map(str::to_string).collect(),
            })?;

        let mut passages = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let text = record.get(column_idx).ok_or_else(|| CorpusError::MalformedRow {
                row,
                reason: format!("missing field {}", column_idx),
            })?;
            passages.push(text.to_string());
        }

        info!(
            path = %path.display(),
            column,
            passages = passages.len(),
            "Corpus loaded"
        );

        Ok(Self {
            passages: passages.into(),
        })
    }

    pub fn from_passages<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            passages: passages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.passages.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.passages.iter().map(String::as_str)
    }
}
