//! Error types for the annotation core.
//!
//! Three failure kinds cover the whole tool: audio that cannot be decoded,
//! a backing file that cannot be parsed, and plain I/O failures. Nothing is
//! retried; every error is surfaced synchronously to the immediate caller.

use std::path::PathBuf;
use thiserror::Error;

/// The audio file could not be read far enough to establish its format and
/// duration. The annotator shows these as warnings and skips the file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported audio format: {extension}")]
    Unsupported { extension: String },

    #[error("{}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn invalid(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Failure in the annotation table or its backing file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file exists but does not parse under the fixed schema.
    /// Never auto-repaired; the caller decides whether to reinitialize.
    #[error("{}: line {line}: {reason}", .path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Reading or rewriting the backing file failed. The in-memory table is
    /// left as it was before the failed operation.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
