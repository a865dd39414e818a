use std::sync::Arc;

use async_trait::async_trait;
use ragbench_rag::LanguageModel;
use tracing::debug;

use super::{FAITHFULNESS, Metric, join_contexts, parse_verdict, split_statements};
use crate::error::Result;
use crate::result::EvaluationRecord;

/// Fraction of the answer's statements that the retrieved contexts support.
///
/// The answer is split into statements and the language model judges each
/// one against the joined contexts. An answer without statements scores
/// `NaN`, which the evaluator records as `0.0`.
pub struct Faithfulness {
    llm: Arc<dyn LanguageModel>,
}

impl Faithfulness {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }
}

fn judge_prompt(context: &str, statement: &str) -> String {
    format!(
        "Consider the given context and the following statement, then determine whether the \
statement is supported by the information present in the context.\n\n\
Context:\n{context}\n\n\
Statement: {statement}\n\n\
Answer with a single word, Yes or No."
    )
}

#[async_trait]
impl Metric for Faithfulness {
    fn name(&self) -> &str {
        FAITHFULNESS
    }

    async fn score(&self, record: &EvaluationRecord) -> Result<f64> {
        let statements = split_statements(&record.answer);
        if statements.is_empty() {
            return Ok(f64::NAN);
        }
        if record.contexts.is_empty() {
            return Ok(0.0);
        }

        let context = join_contexts(&record.contexts);
        let mut supported = 0usize;
        for statement in &statements {
            let reply = self.llm.complete(&judge_prompt(&context, statement)).await?;
            if parse_verdict(FAITHFULNESS, &reply)? {
                supported += 1;
            }
        }

        debug!(metric = FAITHFULNESS, statements = statements.len(), supported, "judged answer statements");
        Ok(supported as f64 / statements.len() as f64)
    }
}
