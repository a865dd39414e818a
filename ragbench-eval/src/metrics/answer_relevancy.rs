use std::sync::Arc;

use async_trait::async_trait;
use ragbench_rag::{EmbeddingProvider, LanguageModel, cosine_similarity};
use tracing::debug;

use super::{ANSWER_RELEVANCY, Metric};
use crate::error::{EvalError, Result};
use crate::result::EvaluationRecord;

/// Number of questions generated per answer unless configured otherwise.
pub const DEFAULT_STRICTNESS: usize = 3;

/// How well the answer addresses the question.
///
/// The language model writes `strictness` questions that the answer would
/// respond to; the score is the mean cosine similarity between the embedded
/// original question and each generated one, floored at zero.
pub struct AnswerRelevancy {
    llm: Arc<dyn LanguageModel>,
    embedder: Arc<dyn EmbeddingProvider>,
    strictness: usize,
}

impl AnswerRelevancy {
    pub fn new(llm: Arc<dyn LanguageModel>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { llm, embedder, strictness: DEFAULT_STRICTNESS }
    }

    /// Set how many questions are generated per answer (at least one).
    pub fn with_strictness(mut self, strictness: usize) -> Self {
        self.strictness = strictness.max(1);
        self
    }

    pub fn strictness(&self) -> usize {
        self.strictness
    }
}

fn question_prompt(answer: &str, attempt: usize) -> String {
    format!(
        "Write one question that the following answer responds to. Reply with the question \
only (attempt {attempt}).\n\n\
Answer: {answer}\n\n\
Question:"
    )
}

fn clean_question(reply: &str) -> &str {
    let reply = reply.trim();
    reply.strip_prefix("Question:").map(str::trim).unwrap_or(reply)
}

#[async_trait]
impl Metric for AnswerRelevancy {
    fn name(&self) -> &str {
        ANSWER_RELEVANCY
    }

    async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
        if record.answer.trim().is_empty() {
            return Ok(0.0);
        }

        let mut generated = Vec::with_capacity(self.strictness);
        for attempt in 1..=self.strictness {
            let reply = self.llm.complete(&question_prompt(&record.answer, attempt)).await?;
            let question = clean_question(&reply);
            if !question.is_empty() {
                generated.push(question.to_string());
            }
        }
        if generated.is_empty() {
            return Ok(0.0);
        }

        let original = self.embedder.embed(&record.question).await?;
        let texts: Vec<&str> = generated.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != generated.len() {
            return Err(EvalError::metric(
                ANSWER_RELEVANCY,
                format!("expected {} embeddings, got {}", generated.len(), embeddings.len()),
            ));
        }

        let mean = embeddings
            .iter()
            .map(|vector| f64::from(cosine_similarity(&original, vector)))
            .sum::<f64>()
            / embeddings.len() as f64;

        debug!(metric = ANSWER_RELEVANCY, generated = generated.len(), mean, "compared generated questions");
        Ok(mean.max(0.0))
    }
}
