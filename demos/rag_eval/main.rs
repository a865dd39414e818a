//! # RAG Evaluation Example
//!
//! Ingests a small corpus, answers the questions of `eval_dataset.json` and
//! prints the evaluation report.
//!
//! Embeddings, answers and judgements come from deterministic in-process
//! stand-ins, so it runs with **zero API keys**.
//!
//! Run: `cargo run --example rag_eval`
//! Verbose: `RUST_LOG=debug cargo run --example rag_eval`

use std::collections::HashSet;
use std::sync::Arc;

use ragbench_eval::{EvalConfig, Evaluator};
use ragbench_rag::{
    Document, EmbeddingProvider, IngestPipeline, LanguageModel, RagConfig, RagQueryEngine,
    RecursiveChunker, Retriever, VectorIndex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CORPUS: &str = include_str!("corpus.txt");
const DATASET: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/rag_eval/eval_dataset.json");

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 2).map(str::to_lowercase)
}

// ---------------------------------------------------------------------------
// BagOfWordsEmbedder: hashed word counts, L2-normalised
// ---------------------------------------------------------------------------

struct BagOfWordsEmbedder {
    dimensions: usize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> ragbench_rag::Result<Vec<f32>> {
        let mut emb = vec![0.0f32; self.dimensions];
        for word in words(text) {
            let hash = word.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// ExtractiveModel: answers with the first sentence of the best context
// ---------------------------------------------------------------------------

struct ExtractiveModel;

#[async_trait::async_trait]
impl LanguageModel for ExtractiveModel {
    async fn complete(&self, prompt: &str) -> ragbench_rag::Result<String> {
        // The default template puts the contexts between the instructions
        // and the question, separated by blank lines.
        let context = prompt.split("\n\n").nth(1).unwrap_or_default();
        let first_sentence = context.split_inclusive(". ").next().unwrap_or(context);
        Ok(first_sentence.trim().to_string())
    }
}

// ---------------------------------------------------------------------------
// OverlapJudge: says "Yes" when most words of the judged text appear in the
// rest of the prompt
// ---------------------------------------------------------------------------

struct OverlapJudge;

impl OverlapJudge {
    fn verdict(prompt: &str, marker: &str) -> String {
        let Some(start) = prompt.find(marker) else {
            return "No".to_string();
        };
        let rest = &prompt[start + marker.len()..];
        let judged = rest.split("\n\n").next().unwrap_or_default();
        let others: HashSet<String> =
            words(&prompt[..start]).chain(words(&rest[judged.len()..])).collect();

        let judged: Vec<String> = words(judged).collect();
        let found = judged.iter().filter(|w| others.contains(*w)).count();
        (if !judged.is_empty() && found * 2 >= judged.len() { "Yes" } else { "No" }).to_string()
    }
}

#[async_trait::async_trait]
impl LanguageModel for OverlapJudge {
    async fn complete(&self, prompt: &str) -> ragbench_rag::Result<String> {
        if prompt.starts_with("Write one question") {
            let answer = prompt.split("Answer: ").nth(1).unwrap_or_default();
            let answer = answer.split("\n\n").next().unwrap_or_default();
            return Ok(format!("What is it that {}?", answer.trim_end_matches('.')));
        }
        let marker = if prompt.contains("Statement: ") { "Statement: " } else { "Context: " };
        Ok(Self::verdict(prompt, marker))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // -- 1. Configure chunking and retrieval --------------------------------
    let config = RagConfig::builder().chunk_size(200).chunk_overlap(40).top_k(2).build()?;

    // -- 2. Ingest the corpus ---------------------------------------------
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(BagOfWordsEmbedder { dimensions: 128 });
    let index = Arc::new(VectorIndex::new(embedder.clone()));
    let pipeline = IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::from_config(&config)?))
        .index(index.clone())
        .build()?;
    let chunks = pipeline.ingest(&Document::new("corpus", CORPUS)).await?;
    println!("Indexed {} chunks", chunks.len());

    // -- 3. Build the query engine -----------------------------------------
    let engine = RagQueryEngine::builder()
        .retriever(Retriever::new(index.clone(), config.top_k)?)
        .language_model(Arc::new(ExtractiveModel))
        .build()?;

    let response = engine.query("What does RAG combine?").await?;
    println!("\nQ: {}\nA: {}", response.question, response.answer);
    for (i, context) in response.contexts.iter().enumerate() {
        println!("  [{}] {}", i + 1, context.lines().next().unwrap_or_default());
    }

    // -- 4. Evaluate --------------------------------------------------------
    let mut evaluator = Evaluator::builder()
        .engine(Arc::new(engine))
        .judge(Arc::new(OverlapJudge), embedder)
        .config(EvalConfig { concurrency: 2, ..EvalConfig::default() })
        .build()?;

    let (result, report) = evaluator.run(DATASET).await?;
    info!(run_id = %result.run_id, overall = result.overall(), "evaluation finished");
    println!("\n{report}");

    println!("\nPer-sample scores:");
    for sample in &result.per_sample {
        println!("  {}", sample.record.question);
        for (metric, score) in &sample.scores {
            println!("    {metric}: {score:.4}");
        }
    }

    // -- 5. Persist the index and reload it ---------------------------------
    let path = std::env::temp_dir().join("ragbench_demo_index.json");
    index.save(&path).await?;
    info!(path = %path.display(), "index saved");
    let reloaded = VectorIndex::load(index.embedder().clone(), &path).await?;
    println!("\nReloaded {} records from {}", reloaded.count().await, path.display());

    Ok(())
}
