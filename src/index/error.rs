use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by index loading, persistence and search.
pub enum IndexError {
    /// Reading or writing the index file failed.
    #[error("index I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File does not start with the index magic bytes.
    #[error("'{path}' is not a vector index file")]
    BadMagic { path: PathBuf },

    /// Header names a metric this build does not know.
    #[error("unsupported distance metric tag: {tag}")]
    UnsupportedMetric { tag: u8 },

    /// Header names an element type this build does not know.
    #[error("unsupported element type tag: {tag}")]
    UnsupportedElementType { tag: u8 },

    /// Header and payload disagree, or the payload is misaligned.
    #[error("corrupt index: {reason}")]
    Corrupt { reason: String },

    /// Vector dimension mismatch.
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
