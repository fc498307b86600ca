use thiserror::Error;

/// Convenience result type for parse operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Error type surfaced by the format factory and by row streams.
///
/// Malformed input never shows up here: a bad record (or a bad document)
/// is yielded as a [`crate::types::ParsedRow`] error row so the stream can
/// report it in sequence. This enum is reserved for failures that are not
/// properties of the data itself.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Underlying I/O error from the caller-supplied stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The format name handed to the factory is not recognized.
    #[error("unsupported format '{0}' (expected CSV, TSV, JSON, JSONL, XML, YAML or YML)")]
    UnsupportedFormat(String),

    /// The caller cancelled the parse between rows.
    ///
    /// Never reported as a row-level `parse_error`; callers must be able
    /// to tell "stopped on request" from "malformed data".
    #[error("parse cancelled")]
    Cancelled,
}
