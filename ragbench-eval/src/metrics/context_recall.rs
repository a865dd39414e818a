use std::sync::Arc;

use async_trait::async_trait;
use ragbench_rag::LanguageModel;
use tracing::debug;

use super::{CONTEXT_RECALL, Metric, join_contexts, parse_verdict, split_statements};
use crate::error::Result;
use crate::result::EvaluationRecord;

/// Fraction of the ground truth's statements attributable to the retrieved
/// contexts.
pub struct ContextRecall {
    llm: Arc<dyn LanguageModel>,
}

impl ContextRecall {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn attribution_prompt(question: &str, context: &str, statement: &str) -> String {
    format!(
        "Given a question, a context and a statement taken from the reference answer, decide \
whether the statement can be attributed to the context.\n\n\
Question: {question}\n\n\
Context:\n{context}\n\n\
Statement: {statement}\n\n\
Answer with a single word, Yes or No."
    )
}

#[async_trait]
impl Metric for ContextRecall {
    fn name(&self) -> &str {
        CONTEXT_RECALL
    }

    async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
        let statements = split_statements(&record.ground_truth);
        if statements.is_empty() {
            return Ok(f64::NAN);
        }
        if record.contexts.is_empty() {
            return Ok(0.0);
        }

        let context = join_contexts(&record.contexts);
        let mut attributed = 0usize;
        for statement in &statements {
            let prompt = attribution_prompt(&record.question, &context, statement);
            if parse_verdict(CONTEXT_RECALL, &self.llm.complete(&prompt).await?)? {
                attributed += 1;
            }
        }

        debug!(metric = CONTEXT_RECALL, statements = statements.len(), attributed, "judged ground truth statements");
        Ok(attributed as f64 / statements.len() as f64)
    }
}
