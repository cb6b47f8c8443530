//! Errors surfaced by reconciliation.
//!
//! Only malformed input and failing external transformers are errors.
//! References that do not resolve are handled by the resolver's cleanup
//! policy and never reach the caller.

use thiserror::Error;

/// Errors that can occur while decoding directories or reconciling them.
#[derive(Debug, Error)]
pub enum Error {
    /// A directory was expected to be a sequence of rows.
    #[error("directory must be a sequence of rows, found {found}")]
    NotASequence { found: &'static str },

    /// A row could not be decoded into a record.
    #[error("row {row} is malformed: {source}")]
    MalformedRow {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A row has no identity key, or a null one. Records are indexed by key,
    /// so such a row cannot take part in reconciliation.
    #[error("row {row} has no identity key")]
    MissingKey { row: usize },

    /// The input was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A processor name that no transformer answers to.
    #[error("unknown processor: {0}")]
    UnknownProcessor(String),

    /// An external transformer failed.
    #[error("{processor} transformer failed: {message}")]
    Transformer { processor: String, message: String },
}

impl Error {
    /// Create a transformer error.
    pub fn transformer(processor: impl Into<String>, message: impl Into<String>) -> Error {
        return Error::Transformer {
            processor: processor.into(),
            message: message.into(),
        };
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
