//! Brute-force vector index using cosine similarity.
//!
//! [`VectorIndex`] owns an insertion-ordered list of [`VectorRecord`]s behind a
//! `tokio::sync::RwLock`. Search is a linear scan, which keeps rankings exact
//! and reproducible; a saved index reloads into one that returns identical
//! rankings and scores.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::document::{Chunk, SearchResult, VectorRecord};
use crate::embedding::{EmbeddingProvider, cosine_similarity};
use crate::error::{RagError, Result};

/// Version tag written into persisted indexes.
const FORMAT_VERSION: u32 = 1;

/// An in-memory vector index with exact top-K search and file persistence.
///
/// Scores are cosine similarities: higher means more similar, and results
/// are returned best-first. Records with equal scores keep insertion order.
///
/// Inserts are all-or-nothing: the whole batch is embedded and checked
/// before the write lock is taken, so readers never observe a partial batch.
///
/// # Example
///
/// ```rust,ignore
/// use ragbench_rag::VectorIndex;
///
/// let index = VectorIndex::new(Arc::new(my_embedder));
/// index.insert(&chunks).await?;
/// let results = index.search("what is rag?", 4).await?;
/// index.save("index.json").await?;
/// ```
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    dimensions: usize,
    records: RwLock<Vec<VectorRecord>>,
}

#[derive(Serialize)]
struct PersistedIndexRef<'a> {
    format_version: u32,
    dimensions: usize,
    records: &'a [VectorRecord],
}

#[derive(Deserialize)]
struct PersistedIndex {
    format_version: u32,
    dimensions: usize,
    records: Vec<VectorRecord>,
}

impl VectorIndex {
    /// Create an empty index whose dimensionality is fixed by `embedder`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let dimensions = embedder.dimensions();
        Self { embedder, dimensions, records: RwLock::new(Vec::new()) }
    }

    /// Create an index and bulk-insert `chunks` into it.
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub async fn from_chunks(embedder: Arc<dyn EmbeddingProvider>, chunks: &[Chunk]) -> Result<Self> {
        let index = Self::new(embedder);
        index.insert(chunks).await?;
        Ok(index)
    }

    /// Dimensionality shared by every record in this index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The embedding provider used for inserts and queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Total number of records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the index holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of all records in insertion order.
    pub async fn records(&self) -> Vec<VectorRecord> {
        self.records.read().await.clone()
    }

    /// Embed `chunks` and append them to the index as one atomic batch.
    ///
    /// Returns the ids assigned to the new records, in input order.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if `chunks` is empty.
    /// - [`RagError::ExternalProvider`] if embedding fails or returns the
    ///   wrong number of vectors or non-finite values.
    /// - [`RagError::DimensionMismatch`] if a vector has the wrong length.
    ///
    /// On error the index is left unchanged.
    pub async fn insert(&self, chunks: &[Chunk]) -> Result<Vec<Uuid>> {
        if chunks.is_empty() {
            return Err(RagError::EmptyInput("cannot insert an empty batch of chunks".to_string()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(batch_size = chunks.len(), error = %e, "embedding failed during insert");
            e
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::provider(
                "embedding",
                format!("returned {} embeddings for {} texts", embeddings.len(), chunks.len()),
            ));
        }
        for vector in &embeddings {
            self.check_vector(vector)?;
        }

        let new_records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| VectorRecord { id: Uuid::new_v4(), vector, chunk: chunk.clone() })
            .collect();
        let ids = new_records.iter().map(|r| r.id).collect();

        let mut records = self.records.write().await;
        records.extend(new_records);
        info!(inserted = chunks.len(), total = records.len(), "inserted chunks into index");

        Ok(ids)
    }

    /// Embed `query` and return the `min(k, count)` most similar chunks, best-first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `k == 0`.
    /// - [`RagError::EmptyInput`] if `query` is blank.
    /// - [`RagError::Uninitialized`] if the index holds no records.
    /// - [`RagError::ExternalProvider`] if embedding the query fails.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        validate_k(k)?;
        if query.trim().is_empty() {
            return Err(RagError::EmptyInput("query must not be blank".to_string()));
        }
        self.ensure_populated().await?;

        let query_vector = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during search");
            e
        })?;
        self.check_vector(&query_vector)?;

        self.rank(&query_vector, k).await
    }

    /// Return the `min(k, count)` records most similar to `vector`, best-first.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `k == 0`.
    /// - [`RagError::DimensionMismatch`] if `vector` has the wrong length.
    /// - [`RagError::Uninitialized`] if the index holds no records.
    pub async fn search_by_vector(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        validate_k(k)?;
        self.check_vector(vector)?;
        self.ensure_populated().await?;
        self.rank(vector, k).await
    }

    async fn rank(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let records = self.records.read().await;
        let mut scored: Vec<SearchResult> = records
            .iter()
            .map(|record| SearchResult {
                chunk: record.chunk.clone(),
                score: cosine_similarity(&record.vector, query_vector),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        debug!(k, result_count = scored.len(), "index search completed");
        Ok(scored)
    }

    /// Persist every record to `path`.
    ///
    /// The index is written to a uniquely named sibling temporary file which
    /// is then renamed over `path`, so `path` either holds the previous content or the
    /// complete new index. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] on filesystem failure; the temporary file is
    /// removed before returning.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let records = self.records.read().await;
        let persisted = PersistedIndexRef {
            format_version: FORMAT_VERSION,
            dimensions: self.dimensions,
            records: &records,
        };
        let bytes = serde_json::to_vec(&persisted).map_err(std::io::Error::other)?;
        let record_count = records.len();
        drop(records);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temporary_path(path);
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            error!(path = %path.display(), error = %e, "failed to save vector index");
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(path = %path.display(), record_count, "saved vector index");
        Ok(())
    }

    /// Reconstruct an index previously written by [`save`](Self::save).
    ///
    /// `embedder` must produce vectors of the persisted dimensionality; it is
    /// used for subsequent inserts and queries.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`] if `path` does not exist.
    /// - [`RagError::Parse`] if the file is not a valid persisted index.
    /// - [`RagError::DimensionMismatch`] if `embedder` disagrees with the
    ///   persisted dimensionality.
    pub async fn load(embedder: Arc<dyn EmbeddingProvider>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            return Err(RagError::NotFound(format!("vector index not found: {}", path.display())));
        }

        let bytes = tokio::fs::read(path).await?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes).map_err(|e| {
            RagError::Parse(format!("invalid vector index file {}: {e}", path.display()))
        })?;

        if persisted.format_version != FORMAT_VERSION {
            return Err(RagError::Parse(format!(
                "unsupported vector index format version {}",
                persisted.format_version
            )));
        }
        if let Some(record) = persisted.records.iter().find(|r| r.vector.len() != persisted.dimensions) {
            return Err(RagError::Parse(format!(
                "record {} has {} dimensions, index declares {}",
                record.id,
                record.vector.len(),
                persisted.dimensions
            )));
        }
        if embedder.dimensions() != persisted.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: persisted.dimensions,
                actual: embedder.dimensions(),
            });
        }

        info!(path = %path.display(), record_count = persisted.records.len(), "loaded vector index");
        Ok(Self {
            embedder,
            dimensions: persisted.dimensions,
            records: RwLock::new(persisted.records),
        })
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch { expected: self.dimensions, actual: vector.len() });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RagError::provider("embedding", "embedding contains non-finite values"));
        }
        Ok(())
    }

    async fn ensure_populated(&self) -> Result<()> {
        if self.records.read().await.is_empty() {
            return Err(RagError::Uninitialized("vector index holds no records".to_string()));
        }
        Ok(())
    }
}

fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(RagError::InvalidArgument("k must be greater than 0".to_string()));
    }
    Ok(())
}

/// A sibling of `path` unique to one save, so concurrent saves to the same
/// target never share a temporary file.
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_paths_are_unique_siblings() {
        let target = Path::new("dir/index.json");
        let first = temporary_path(target);
        let second = temporary_path(target);

        assert_ne!(first, second);
        for tmp in [&first, &second] {
            assert_eq!(tmp.parent(), target.parent());
            let name = tmp.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("index.json."));
            assert!(name.ends_with(".tmp"));
        }
    }

    #[test]
    fn zero_k_is_rejected() {
        assert!(matches!(validate_k(0), Err(RagError::InvalidArgument(_))));
        assert!(validate_k(1).is_ok());
    }
}
