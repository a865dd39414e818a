//! End-to-end tests for ingestion and retrieval-augmented querying.

mod common;

use std::sync::Arc;

use common::{FailingEmbeddingProvider, HashEmbeddingProvider, RecordingModel, UnavailableModel};
use ragbench_rag::{
    Document, IngestPipeline, LanguageModel, PromptTemplate, RagError, RagQueryEngine,
    RecursiveChunker, Retriever, VectorIndex,
};

const DIM: usize = 64;

fn documents() -> Vec<Document> {
    vec![
        Document::new("paris", "The Eiffel Tower is located in Paris, the capital of France."),
        Document::new(
            "plants",
            "Photosynthesis converts sunlight, water and carbon dioxide into glucose.",
        ),
        Document::new("china", "The Great Wall of China stretches across northern China."),
    ]
}

async fn populated_index() -> Arc<VectorIndex> {
    let index = Arc::new(VectorIndex::new(Arc::new(HashEmbeddingProvider::new(DIM))));
    let pipeline = IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::new(500, 50).unwrap()))
        .index(index.clone())
        .build()
        .unwrap();
    let chunks = pipeline.ingest_batch(&documents()).await.unwrap();
    assert_eq!(chunks.len(), 3);
    index
}

fn engine(index: Arc<VectorIndex>, k: usize, model: Arc<dyn LanguageModel>) -> RagQueryEngine {
    RagQueryEngine::builder()
        .retriever(Retriever::new(index, k).unwrap())
        .language_model(model)
        .build()
        .unwrap()
}

#[tokio::test]
async fn query_returns_answer_with_ranked_contexts() {
    let model = Arc::new(RecordingModel::new("It is in Paris."));
    let engine = engine(populated_index().await, 2, model.clone());

    let response = engine.query("Where is the Eiffel Tower located?").await.unwrap();

    assert_eq!(response.question, "Where is the Eiffel Tower located?");
    assert_eq!(response.answer, "It is in Paris.");
    assert_eq!(response.contexts.len(), 2);
    assert_eq!(response.source_chunks.len(), 2);
    for (context, chunk) in response.contexts.iter().zip(&response.source_chunks) {
        assert_eq!(context, &chunk.text);
    }
    assert_eq!(response.source_chunks[0].source_id, "paris");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Where is the Eiffel Tower located?"));
    for context in &response.contexts {
        assert!(prompts[0].contains(context.as_str()));
    }
}

#[tokio::test]
async fn k_larger_than_index_returns_every_chunk() {
    let engine = engine(populated_index().await, 10, Arc::new(RecordingModel::new("ok")));
    let response = engine.query("What does photosynthesis produce?").await.unwrap();

    assert_eq!(response.contexts.len(), 3);
    assert_eq!(response.source_chunks[0].source_id, "plants");
}

#[tokio::test]
async fn custom_template_is_rendered() {
    let model = Arc::new(RecordingModel::new("ok"));
    let engine = RagQueryEngine::builder()
        .retriever(Retriever::new(populated_index().await, 1).unwrap())
        .language_model(model.clone())
        .template(PromptTemplate::new("Q: {question}\nC: {context}").unwrap())
        .build()
        .unwrap();

    engine.query("Where is the Eiffel Tower located?").await.unwrap();

    let prompt = &model.prompts()[0];
    assert!(prompt.starts_with("Q: Where is the Eiffel Tower located?\nC: The Eiffel Tower"));
}

#[tokio::test]
async fn blank_question_is_rejected_before_any_call() {
    let model = Arc::new(RecordingModel::new("unused"));
    let engine = engine(populated_index().await, 2, model.clone());

    assert!(matches!(engine.query("  \n").await, Err(RagError::EmptyInput(_))));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn zero_k_is_rejected() {
    let index = Arc::new(VectorIndex::new(Arc::new(HashEmbeddingProvider::new(DIM))));
    assert!(matches!(Retriever::new(index, 0), Err(RagError::InvalidArgument(_))));
}

#[tokio::test]
async fn empty_index_reports_uninitialized() {
    let index = Arc::new(VectorIndex::new(Arc::new(HashEmbeddingProvider::new(DIM))));
    let engine = engine(index, 2, Arc::new(RecordingModel::new("unused")));

    assert!(matches!(engine.query("anything").await, Err(RagError::Uninitialized(_))));
}

#[tokio::test]
async fn language_model_errors_propagate_unchanged() {
    let engine = engine(populated_index().await, 2, Arc::new(UnavailableModel));

    match engine.query("Where is the Eiffel Tower located?").await {
        Err(RagError::ExternalProvider { provider, .. }) => assert_eq!(provider, "unavailable"),
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_ingestion_inserts_nothing() {
    let index = Arc::new(VectorIndex::new(Arc::new(FailingEmbeddingProvider)));
    let pipeline = IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::new(100, 10).unwrap()))
        .index(index.clone())
        .build()
        .unwrap();

    assert!(pipeline.ingest_batch(&documents()).await.is_err());
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn blank_documents_ingest_nothing() {
    let index = Arc::new(VectorIndex::new(Arc::new(HashEmbeddingProvider::new(DIM))));
    let pipeline = IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::new(100, 10).unwrap()))
        .index(index.clone())
        .build()
        .unwrap();

    let chunks = pipeline.ingest(&Document::new("blank", "   ")).await.unwrap();
    assert!(chunks.is_empty());
    assert!(index.is_empty().await);
}

#[test]
fn builders_require_their_fields() {
    assert!(matches!(RagQueryEngine::builder().build(), Err(RagError::Configuration(_))));
    assert!(matches!(IngestPipeline::builder().build(), Err(RagError::Configuration(_))));
}
