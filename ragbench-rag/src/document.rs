//! Data types for documents, chunks, index records and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key holding a chunk's position within its source.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Metadata key holding the byte offset of a chunk's text inside its source.
pub const START_INDEX_KEY: &str = "start_index";

/// A source document containing text content and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }
}

/// A bounded, contiguous slice of a [`Document`].
///
/// Chunks are created once by a [`Chunker`](crate::Chunker) and never
/// modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub text: String,
    /// The ID of the parent [`Document`].
    pub source_id: String,
    /// Position of this chunk among the chunks of its source, starting at 0.
    pub sequence_index: usize,
    /// Metadata inherited from the parent document plus chunk-specific fields.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Create a chunk with no metadata.
    pub fn new(text: impl Into<String>, source_id: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            text: text.into(),
            source_id: source_id.into(),
            sequence_index,
            metadata: HashMap::new(),
        }
    }

    /// Byte offset of this chunk's text inside its source, when recorded.
    pub fn start_index(&self) -> Option<usize> {
        self.metadata.get(START_INDEX_KEY).and_then(|v| v.parse().ok())
    }
}

/// A chunk stored in a [`VectorIndex`](crate::VectorIndex) together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    /// Opaque record identifier.
    pub id: Uuid,
    /// Embedding of `chunk.text`.
    pub vector: Vec<f32>,
    /// The embedded chunk.
    pub chunk: Chunk,
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
