//! Fixed top-K retrieval over a [`VectorIndex`].

use std::sync::Arc;

use tracing::debug;

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Wraps a [`VectorIndex`] with a fixed top-K policy.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    k: usize,
}

impl Retriever {
    /// Create a retriever returning the `k` best chunks per query.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k == 0`.
    pub fn new(index: Arc<VectorIndex>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than 0".to_string()));
        }
        Ok(Self { index, k })
    }

    /// Number of chunks returned per query.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Return up to `k` `(chunk, score)` pairs for `query`, best-first.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`VectorIndex::search`].
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let results = self.index.search(query, self.k).await?;
        debug!(k = self.k, result_count = results.len(), "retrieved chunks");
        Ok(results)
    }
}
