//! # RAG Evaluation with OpenAI-compatible providers
//!
//! Same flow as `rag_eval`, with embeddings, answers and judgements served
//! by an OpenAI-compatible API.
//!
//! Requires `OPENAI_API_KEY`. Set `OPENAI_BASE_URL` to target another
//! compatible endpoint, and `CHAT_MODEL` / `EMBEDDING_MODEL` to pick models.
//!
//! Run: `cargo run --example rag_eval_openai --features openai`

use std::sync::Arc;

use ragbench_eval::Evaluator;
use ragbench_rag::openai::{OpenAIChatModel, OpenAIConfig, OpenAIEmbeddingProvider};
use ragbench_rag::{
    Document, EmbeddingProvider, IngestPipeline, LanguageModel, RagConfig, RagQueryEngine,
    RecursiveChunker, Retriever, VectorIndex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CORPUS: &str = include_str!("../rag_eval/corpus.txt");
const DATASET: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/rag_eval/eval_dataset.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let embedding_model =
        std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());

    // Each provider gets its own explicit config.
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OpenAIEmbeddingProvider::new(OpenAIConfig::from_env(embedding_model)?, 1536)?);
    let chat_model_name = chat_model.clone();
    let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIChatModel::new(OpenAIConfig::from_env(chat_model)?)?);

    let config = RagConfig::default();
    let index = Arc::new(VectorIndex::new(embedder.clone()));
    let chunks = IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::from_config(&config)?))
        .index(index.clone())
        .build()?
        .ingest(&Document::new("corpus", CORPUS))
        .await?;
    info!(chunk_count = chunks.len(), %chat_model_name, "corpus indexed");

    let engine = RagQueryEngine::builder()
        .retriever(Retriever::new(index, config.top_k)?)
        .language_model(llm.clone())
        .build()?;

    let mut evaluator =
        Evaluator::builder().engine(Arc::new(engine)).judge(llm, embedder).build()?;
    let (result, report) = evaluator.run(DATASET).await?;
    info!(run_id = %result.run_id, sample_count = result.sample_count, "evaluation finished");
    println!("{report}");

    Ok(())
}
