use std::sync::Arc;

use async_trait::async_trait;
use ragbench_rag::LanguageModel;
use tracing::debug;

use super::{CONTEXT_PRECISION, Metric, parse_verdict};
use crate::error::Result;
use crate::result::EvaluationRecord;

/// Average precision of the retrieved contexts, ranked as retrieved.
///
/// Each context is judged useful or not for reaching the ground truth; the
/// score is `Σ precision@k · v_k / Σ v_k` over ranks `k` with verdicts `v_k`.
/// Useful contexts near the top raise the score.
pub struct ContextPrecision {
    llm: Arc<dyn LanguageModel>,
}

impl ContextPrecision {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn usefulness_prompt(question: &str, context: &str, ground_truth: &str) -> String {
    format!(
        "Given a question, a reference answer and a context, verify whether the context was \
useful in arriving at the reference answer.\n\n\
Question: {question}\n\n\
Context: {context}\n\n\
Reference answer: {ground_truth}\n\n\
Answer with a single word, Yes or No."
    )
}

/// Average precision of a ranked list of relevance verdicts.
pub(crate) fn average_precision(verdicts: &[bool]) -> f64 {
    let mut relevant = 0usize;
    let mut weighted = 0.0;
    for (rank, &useful) in verdicts.iter().enumerate() {
        if useful {
            relevant += 1;
            weighted += relevant as f64 / (rank + 1) as f64;
        }
    }
    if relevant == 0 { 0.0 } else { weighted / relevant as f64 }
}

#[async_trait]
impl Metric for ContextPrecision {
    fn name(&self) -> &str {
        CONTEXT_PRECISION
    }

    async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
        let mut verdicts = Vec::with_capacity(record.contexts.len());
        for context in &record.contexts {
            let prompt = usefulness_prompt(&record.question, context, &record.ground_truth);
            verdicts.push(parse_verdict(CONTEXT_PRECISION, &self.llm.complete(&prompt).await?)?);
        }

        let score = average_precision(&verdicts);
        debug!(metric = CONTEXT_PRECISION, contexts = verdicts.len(), score, "judged context usefulness");
        Ok(score)
    }
}
