//! # ragbench-rag
//!
//! Retrieval-augmented generation building blocks:
//!
//! - [`RecursiveChunker`] splits text into overlapping, size-bounded chunks
//! - [`VectorIndex`] embeds chunks and serves exact top-K cosine search,
//!   with all-or-nothing inserts and atomic save/load
//! - [`Retriever`] applies a fixed top-K policy to an index
//! - [`RagQueryEngine`] turns retrieved chunks into a prompt and asks a
//!   [`LanguageModel`] for the answer
//! - [`IngestPipeline`] chunks documents into an index
//!
//! Embedding and language models are consumed through the
//! [`EmbeddingProvider`] and [`LanguageModel`] traits. OpenAI-compatible
//! implementations live in [`openai`] behind the `openai` feature.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod retriever;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{CHUNK_SIZE_SLACK, Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult, VectorRecord};
pub use embedding::{EmbeddingProvider, cosine_similarity};
pub use engine::{PromptTemplate, RagQueryEngine, RagQueryEngineBuilder, RagResponse};
pub use error::{RagError, Result};
pub use index::VectorIndex;
pub use llm::LanguageModel;
pub use pipeline::{IngestPipeline, IngestPipelineBuilder};
pub use retriever::Retriever;
