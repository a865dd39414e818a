//! Error types for the `ragbench-eval` crate.

use ragbench_rag::RagError;
use thiserror::Error;

/// Errors raised while loading datasets, answering questions or scoring.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The evaluator or a metric was constructed with invalid settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The dataset file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The dataset file is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The dataset is valid JSON but does not match the expected layout.
    #[error("Invalid evaluation dataset format: {0}")]
    Schema(String),

    /// A sample list or batch that must be non-empty was empty.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A metric could not produce a score for a sample.
    #[error("Metric '{metric}' failed: {message}")]
    Metric {
        /// Name of the failing metric.
        metric: String,
        /// A description of the failure.
        message: String,
    },

    /// Reading the dataset file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A retrieval or provider error from the RAG engine.
    #[error(transparent)]
    Rag(#[from] RagError),
}

impl EvalError {
    /// Shorthand for building an [`EvalError::Metric`].
    pub fn metric(metric: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Metric { metric: metric.into(), message: message.into() }
    }
}

/// A convenience result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
