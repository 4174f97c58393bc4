use std::io;

use thiserror::Error;

/// Fatal conditions raised by the passes. None of them is recoverable: the
/// output stream of the pass that raised one must be discarded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed body boundary: {0}")]
    MalformedBoundary(String),

    #[error("header mismatch at line {line}: expected `{expected}`, found `{found}`")]
    HeaderMismatch {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("line {line} is bound twice: first as {first}, then as {second}")]
    ConflictingBinding {
        line: u32,
        first: String,
        second: String,
    },

    #[error("duplicate entry for line {line}")]
    DuplicateLine { line: u32 },

    #[error("pragma at physical line {physical} is not preceded by a line marker")]
    MissingProvenance { physical: usize },

    #[error("{source_name}:{line}: {reason}")]
    Malformed {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(source_name: &str, line: usize, reason: impl Into<String>) -> Self {
        Error::Malformed {
            source_name: source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
