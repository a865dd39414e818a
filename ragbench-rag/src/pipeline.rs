//! Document ingestion.
//!
//! The [`IngestPipeline`] coordinates chunk → embed → insert by composing a
//! [`Chunker`] with a [`VectorIndex`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragbench_rag::{IngestPipeline, RecursiveChunker, VectorIndex};
//!
//! let index = Arc::new(VectorIndex::new(Arc::new(my_embedder)));
//! let pipeline = IngestPipeline::builder()
//!     .chunker(Arc::new(RecursiveChunker::new(500, 50)?))
//!     .index(index.clone())
//!     .build()?;
//!
//! pipeline.ingest_batch(&documents).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Chunks documents and stores them in a [`VectorIndex`].
pub struct IngestPipeline {
    chunker: Arc<dyn Chunker>,
    index: Arc<VectorIndex>,
}

impl IngestPipeline {
    /// Create a new [`IngestPipelineBuilder`].
    pub fn builder() -> IngestPipelineBuilder {
        IngestPipelineBuilder::default()
    }

    /// Return a reference to the target index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Ingest a single document: chunk → embed → insert.
    ///
    /// Returns the chunks that were stored. A document with no text
    /// produces no chunks and leaves the index untouched.
    ///
    /// # Errors
    ///
    /// Propagates [`VectorIndex::insert`] errors; the index is unchanged on error.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        self.ingest_batch(std::slice::from_ref(document)).await
    }

    /// Ingest multiple documents as one all-or-nothing insert.
    ///
    /// Every document is chunked first; the combined chunks are then inserted
    /// with a single call, so either all documents land in the index or none do.
    ///
    /// # Errors
    ///
    /// Propagates [`VectorIndex::insert`] errors; the index is unchanged on error.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let chunks: Vec<Chunk> = documents.iter().flat_map(|d| self.chunker.chunk(d)).collect();
        if chunks.is_empty() {
            info!(document_count = documents.len(), chunk_count = 0, "ingested documents (empty)");
            return Ok(chunks);
        }

        self.index.insert(&chunks).await.map_err(|e| {
            error!(document_count = documents.len(), error = %e, "insert failed during ingestion");
            e
        })?;

        info!(document_count = documents.len(), chunk_count = chunks.len(), "ingested documents");
        Ok(chunks)
    }
}

/// Builder for constructing an [`IngestPipeline`].
#[derive(Default)]
pub struct IngestPipelineBuilder {
    chunker: Option<Arc<dyn Chunker>>,
    index: Option<Arc<VectorIndex>>,
}

impl IngestPipelineBuilder {
    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the target index.
    pub fn index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`IngestPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if any required field is missing.
    pub fn build(self) -> Result<IngestPipeline> {
        let chunker =
            self.chunker.ok_or_else(|| RagError::Configuration("chunker is required".to_string()))?;
        let index =
            self.index.ok_or_else(|| RagError::Configuration("index is required".to_string()))?;
        Ok(IngestPipeline { chunker, index })
    }
}
