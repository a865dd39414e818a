//! Error types for the `ragbench-rag` crate.

use thiserror::Error;

/// Errors that can occur in chunking, indexing and query operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid construction parameters (chunk size/overlap, prompt template).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A collection or string that must hold at least one element was empty.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A runtime argument was out of range (e.g. `k == 0`).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A file or path does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A persisted artifact could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The operation needs prior setup, e.g. searching an index with no records.
    #[error("Uninitialized: {0}")]
    Uninitialized(String),

    /// An embedding or language model call failed.
    #[error("Provider error ({provider}): {message}")]
    ExternalProvider {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality fixed for the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index.
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// Filesystem failure while persisting or loading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Shorthand for building an [`RagError::ExternalProvider`].
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalProvider { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
