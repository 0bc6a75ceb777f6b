//! Error types for codelines

use thiserror::Error;

/// Result type alias for codelines operations
pub type Result<T> = std::result::Result<T, CodeError>;

/// Errors surfaced to callers.
///
/// Malformed source text is never an error: the tokenizer recovers locally and
/// keeps going. Only caller mistakes and environment failures end up here.
#[derive(Error, Debug)]
pub enum CodeError {
    /// A line index outside the current document
    #[error("line index {index} out of range (document has {len} lines)")]
    OutOfRange { index: usize, len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("{0}")]
    Message(String),
}

impl CodeError {
    /// Check whether this is a bounds violation
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, CodeError::OutOfRange { .. })
    }
}
