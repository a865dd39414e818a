//! In-process providers and fixtures shared by the evaluator tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use ragbench_eval::{EvalError, EvaluationRecord, Metric};
use ragbench_rag::{
    Document, EmbeddingProvider, IngestPipeline, LanguageModel, RagError, RagQueryEngine,
    RecursiveChunker, Retriever, VectorIndex,
};

pub const DIM: usize = 64;

/// Bag-of-words embeddings over hashed, lowercased tokens.
pub struct HashEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> ragbench_rag::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIM];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let hash = token
                .to_lowercase()
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3));
            vector[(hash % DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// A language model whose replies are computed from the prompt.
pub struct FnModel<F>(pub F);

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> ragbench_rag::Result<String> {
        Ok((self.0)(prompt))
    }
}

/// A language model whose every call fails.
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn complete(&self, _prompt: &str) -> ragbench_rag::Result<String> {
        Err(RagError::provider("unavailable", "model endpoint unreachable"))
    }
}

/// A metric returning the same value for every record.
pub struct FixedMetric {
    pub name: &'static str,
    pub value: f64,
}

#[async_trait]
impl Metric for FixedMetric {
    fn name(&self) -> &str {
        self.name
    }

    async fn score(&self, _record: &EvaluationRecord) -> ragbench_eval::Result<f64> {
        Ok(self.value)
    }
}

/// A metric that always fails.
pub struct BrokenMetric(pub &'static str);

#[async_trait]
impl Metric for BrokenMetric {
    fn name(&self) -> &str {
        self.0
    }

    async fn score(&self, _record: &EvaluationRecord) -> ragbench_eval::Result<f64> {
        Err(EvalError::metric(self.0, "judge returned garbage"))
    }
}

pub fn corpus() -> Vec<Document> {
    vec![
        Document::new("paris", "The Eiffel Tower is located in Paris, the capital of France."),
        Document::new(
            "plants",
            "Photosynthesis converts sunlight, water and carbon dioxide into glucose.",
        ),
        Document::new("china", "The Great Wall of China stretches across northern China."),
    ]
}

/// An engine over [`corpus`] answering every question with `answer`.
pub async fn engine_with_model(model: Arc<dyn LanguageModel>) -> Arc<RagQueryEngine> {
    let index = Arc::new(VectorIndex::new(Arc::new(HashEmbeddingProvider)));
    IngestPipeline::builder()
        .chunker(Arc::new(RecursiveChunker::new(200, 20).unwrap()))
        .index(index.clone())
        .build()
        .unwrap()
        .ingest_batch(&corpus())
        .await
        .unwrap();

    Arc::new(
        RagQueryEngine::builder()
            .retriever(Retriever::new(index, 2).unwrap())
            .language_model(model)
            .build()
            .unwrap(),
    )
}

pub async fn engine(answer: &'static str) -> Arc<RagQueryEngine> {
    engine_with_model(Arc::new(FnModel(move |_: &str| answer.to_string()))).await
}

pub fn record(question: &str, answer: &str, contexts: &[&str], ground_truth: &str) -> EvaluationRecord {
    EvaluationRecord {
        question: question.to_string(),
        answer: answer.to_string(),
        contexts: contexts.iter().map(|c| c.to_string()).collect(),
        ground_truth: ground_truth.to_string(),
        reference_contexts: None,
    }
}
