//! Property and behaviour tests for the vector index.

mod common;

use std::sync::Arc;

use common::{FailingEmbeddingProvider, HashEmbeddingProvider, WrongSizeEmbeddingProvider};
use proptest::prelude::*;
use ragbench_rag::{Chunk, RagError, VectorIndex};

const DIM: usize = 32;

fn embedder() -> Arc<HashEmbeddingProvider> {
    Arc::new(HashEmbeddingProvider::new(DIM))
}

/// Generate a non-zero L2-normalized vector of the given dimension.
fn arb_normalized_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero vector", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

fn arb_chunks(max: usize) -> impl Strategy<Value = Vec<Chunk>> {
    proptest::collection::vec("[a-z]{3,8}( [a-z]{3,8}){0,6}", 1..max).prop_map(|texts| {
        texts.into_iter().enumerate().map(|(i, text)| Chunk::new(text, "doc_1", i)).collect()
    })
}

/// Names of leftover temporary files in `dir`.
fn temporary_files(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

/// **Top-K bound and ordering**
/// *For any* populated index and `k >= 1`, search returns exactly
/// `min(k, N)` results ordered by descending cosine similarity.
mod prop_search_top_k {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_bounded_by_k_and_ordered(
            chunks in arb_chunks(20),
            query in arb_normalized_vector(DIM),
            k in 1usize..25,
        ) {
            let results = runtime().block_on(async {
                let index = VectorIndex::from_chunks(embedder(), &chunks).await.unwrap();
                index.search_by_vector(&query, k).await.unwrap()
            });

            prop_assert_eq!(results.len(), k.min(chunks.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }

        #[test]
        fn text_search_returns_min_k_n(chunks in arb_chunks(20), k in 1usize..25) {
            let results = runtime().block_on(async {
                let index = VectorIndex::from_chunks(embedder(), &chunks).await.unwrap();
                index.search("some query words", k).await.unwrap()
            });
            prop_assert_eq!(results.len(), k.min(chunks.len()));
        }
    }
}

/// **Incremental insert**
/// *For any* two batches of N and M chunks, the index holds N + M records
/// with distinct ids, in insertion order.
mod prop_incremental_insert {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn count_is_sum_of_batches(first in arb_chunks(15), second in arb_chunks(15)) {
            let (count, records, ids) = runtime().block_on(async {
                let index = VectorIndex::new(embedder());
                let mut ids = index.insert(&first).await.unwrap();
                ids.extend(index.insert(&second).await.unwrap());
                (index.count().await, index.records().await, ids)
            });

            prop_assert_eq!(count, first.len() + second.len());
            let mut unique = ids.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), ids.len());

            let stored: Vec<&Chunk> = records.iter().map(|r| &r.chunk).collect();
            let expected: Vec<&Chunk> = first.iter().chain(second.iter()).collect();
            prop_assert_eq!(stored, expected);
        }
    }
}

/// **Persistence fidelity**
/// *For any* index, save followed by load yields the same records and the
/// same rankings.
mod prop_save_load {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        #[test]
        fn reloaded_index_matches(chunks in arb_chunks(12), query in arb_normalized_vector(DIM)) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("index.json");

            let (before, after, original, reloaded) = runtime().block_on(async {
                let index = VectorIndex::from_chunks(embedder(), &chunks).await.unwrap();
                index.save(&path).await.unwrap();
                let loaded = VectorIndex::load(embedder(), &path).await.unwrap();
                (
                    index.search_by_vector(&query, 5).await.unwrap(),
                    loaded.search_by_vector(&query, 5).await.unwrap(),
                    index.records().await,
                    loaded.records().await,
                )
            });

            prop_assert_eq!(original.len(), reloaded.len());
            for (a, b) in original.iter().zip(&reloaded) {
                prop_assert_eq!(a.id, b.id);
                prop_assert_eq!(&a.chunk, &b.chunk);
                for (x, y) in a.vector.iter().zip(&b.vector) {
                    prop_assert!((x - y).abs() <= 1e-6);
                }
            }

            prop_assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(&after) {
                prop_assert_eq!(&a.chunk, &b.chunk);
                prop_assert!((a.score - b.score).abs() <= 1e-6);
            }
        }
    }
}

#[tokio::test]
async fn search_ranks_relevant_chunk_first() {
    let chunks = vec![
        Chunk::new("rust ownership and borrowing rules", "doc", 0),
        Chunk::new("baking sourdough bread at home", "doc", 1),
        Chunk::new("tomato sauce recipes for pasta", "doc", 2),
    ];
    let index = VectorIndex::from_chunks(embedder(), &chunks).await.unwrap();

    let results = index.search("how does rust borrowing work", 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.text, "rust ownership and borrowing rules");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn equal_scores_keep_insertion_order() {
    let chunks: Vec<Chunk> = (0..4).map(|i| Chunk::new("identical text", "doc", i)).collect();
    let index = VectorIndex::from_chunks(embedder(), &chunks).await.unwrap();

    let results = index.search("identical text", 4).await.unwrap();
    let order: Vec<usize> = results.iter().map(|r| r.chunk.sequence_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn search_validates_arguments() {
    let index = VectorIndex::new(embedder());

    assert!(matches!(index.search("query", 0).await, Err(RagError::InvalidArgument(_))));
    assert!(matches!(index.search("   ", 3).await, Err(RagError::EmptyInput(_))));
    assert!(matches!(index.search("query", 3).await, Err(RagError::Uninitialized(_))));
    assert!(matches!(
        index.search_by_vector(&[1.0, 0.0], 1).await,
        Err(RagError::DimensionMismatch { expected: DIM, actual: 2 })
    ));
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let index = VectorIndex::new(embedder());
    assert!(matches!(index.insert(&[]).await, Err(RagError::EmptyInput(_))));
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn failed_insert_leaves_index_unchanged() {
    let chunks = vec![Chunk::new("alpha", "doc", 0), Chunk::new("beta", "doc", 1)];

    let failing = VectorIndex::new(Arc::new(FailingEmbeddingProvider));
    let err = failing.insert(&chunks).await.unwrap_err();
    assert!(matches!(err, RagError::ExternalProvider { .. }));
    assert_eq!(failing.count().await, 0);

    let wrong_size = VectorIndex::new(Arc::new(WrongSizeEmbeddingProvider));
    let err = wrong_size.insert(&chunks).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 8, actual: 3 }));
    assert_eq!(wrong_size.count().await, 0);
}

#[tokio::test]
async fn load_reports_missing_and_corrupt_files() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(VectorIndex::load(embedder(), &missing).await, Err(RagError::NotFound(_))));

    let corrupt = dir.path().join("corrupt.json");
    std::fs::write(&corrupt, b"{ not json").unwrap();
    assert!(matches!(VectorIndex::load(embedder(), &corrupt).await, Err(RagError::Parse(_))));
}

#[tokio::test]
async fn load_rejects_embedder_with_other_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("index.json");

    let index = VectorIndex::from_chunks(embedder(), &[Chunk::new("alpha beta", "doc", 0)])
        .await
        .unwrap();
    index.save(&path).await.unwrap();
    assert!(temporary_files(&dir.path().join("nested")).is_empty());

    let other = Arc::new(HashEmbeddingProvider::new(DIM * 2));
    assert!(matches!(
        VectorIndex::load(other, &path).await,
        Err(RagError::DimensionMismatch { expected: DIM, actual: 64 })
    ));
}

#[tokio::test]
async fn save_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");

    let index = VectorIndex::from_chunks(embedder(), &[Chunk::new("first", "doc", 0)]).await.unwrap();
    index.save(&path).await.unwrap();
    index.insert(&[Chunk::new("second", "doc", 1)]).await.unwrap();
    index.save(&path).await.unwrap();

    let loaded = VectorIndex::load(embedder(), &path).await.unwrap();
    assert_eq!(loaded.count().await, 2);
}

#[tokio::test]
async fn failed_save_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    // A non-empty directory at the target makes the final rename fail.
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep.txt"), "untouched").unwrap();

    let index = VectorIndex::from_chunks(embedder(), &[Chunk::new("alpha beta", "doc", 0)])
        .await
        .unwrap();
    assert!(matches!(index.save(&path).await, Err(RagError::Io(_))));

    assert!(temporary_files(dir.path()).is_empty());
    assert!(path.is_dir());
    assert_eq!(std::fs::read_to_string(path.join("keep.txt")).unwrap(), "untouched");
    assert_eq!(index.count().await, 1);
}

#[tokio::test]
async fn concurrent_saves_to_one_path_both_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.json");
    let index = VectorIndex::from_chunks(embedder(), &[Chunk::new("alpha beta", "doc", 0)])
        .await
        .unwrap();

    let (first, second) = tokio::join!(index.save(&path), index.save(&path));
    first.unwrap();
    second.unwrap();

    assert!(temporary_files(dir.path()).is_empty());
    let loaded = VectorIndex::load(embedder(), &path).await.unwrap();
    assert_eq!(loaded.count().await, 1);
}
