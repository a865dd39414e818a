//! RAG quality metrics.
//!
//! Each metric is a [`Metric`] strategy scoring one [`EvaluationRecord`] at a
//! time; the evaluator runs every metric in a [`MetricSet`] over every record
//! and averages the results. New metrics are added by putting another
//! strategy into the set.
//!
//! [`MetricSet::ragas`] builds the four standard LLM-as-judge metrics:
//!
//! | Metric | Question answered |
//! |--------|-------------------|
//! | [`Faithfulness`] | Is each statement of the answer supported by the retrieved contexts? |
//! | [`AnswerRelevancy`] | Do questions regenerated from the answer resemble the original question? |
//! | [`ContextPrecision`] | Are the useful contexts ranked first? |
//! | [`ContextRecall`] | Is each statement of the ground truth attributable to the contexts? |

mod answer_relevancy;
mod context_precision;
mod context_recall;
mod faithfulness;

use std::sync::Arc;

use async_trait::async_trait;
use ragbench_rag::{EmbeddingProvider, LanguageModel};

use crate::error::{EvalError, Result};
use crate::result::EvaluationRecord;

pub use answer_relevancy::{AnswerRelevancy, DEFAULT_STRICTNESS};
pub use context_precision::ContextPrecision;
pub use context_recall::ContextRecall;
pub use faithfulness::Faithfulness;

pub const FAITHFULNESS: &str = "faithfulness";
pub const ANSWER_RELEVANCY: &str = "answer_relevancy";
pub const CONTEXT_PRECISION: &str = "context_precision";
pub const CONTEXT_RECALL: &str = "context_recall";

/// A scoring strategy for one evaluation record.
#[async_trait]
pub trait Metric: Send + Sync {
    /// Unique metric name, used as the key in results and reports.
    fn name(&self) -> &str;

    /// Score `record`.
    ///
    /// Scores are expected in `[0, 1]`. The evaluator clamps out-of-range
    /// values and treats errors, `NaN` and infinities as `0.0`.
    async fn score(&self, record: &EvaluationRecord) -> Result<f64>;
}

/// An ordered set of metrics with unique names.
#[derive(Clone, Default)]
pub struct MetricSet {
    metrics: Vec<Arc<dyn Metric>>,
}

impl MetricSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four standard metrics judged by `llm`, with answer relevancy
    /// comparing questions through `embedder`.
    pub fn ragas(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbeddingProvider>,
        strictness: usize,
    ) -> Self {
        Self::new()
            .with_metric(Arc::new(Faithfulness::new(llm.clone())))
            .with_metric(Arc::new(
                AnswerRelevancy::new(llm.clone(), embedder).with_strictness(strictness),
            ))
            .with_metric(Arc::new(ContextPrecision::new(llm.clone())))
            .with_metric(Arc::new(ContextRecall::new(llm)))
    }

    /// Add `metric`, replacing any metric with the same name in place.
    pub fn with_metric(mut self, metric: Arc<dyn Metric>) -> Self {
        match self.metrics.iter().position(|m| m.name() == metric.name()) {
            Some(i) => self.metrics[i] = metric,
            None => self.metrics.push(metric),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Metric>> {
        self.metrics.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl std::fmt::Debug for MetricSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Split text into sentence-like statements.
///
/// Breaks after `.`, `!` or `?` followed by whitespace or end of text, after
/// their full-width forms, and at newlines. Fragments without any
/// alphanumeric character are dropped.
pub(crate) fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\n' {
            current.push(ch);
        }
        let ends_sentence = match ch {
            '\n' | '。' | '！' | '？' => true,
            '.' | '!' | '?' => chars.peek().is_none_or(|next| next.is_whitespace()),
            _ => false,
        };
        if ends_sentence {
            flush_statement(&mut statements, &mut current);
        }
    }
    flush_statement(&mut statements, &mut current);
    statements
}

fn flush_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if statement.chars().any(char::is_alphanumeric) {
        statements.push(statement.to_string());
    }
    current.clear();
}

/// Interpret a judge reply as a yes/no verdict.
///
/// The first word that reads as `yes`/`true` or `no`/`false` (any case,
/// surrounding punctuation ignored) decides; a reply opening with `是` or
/// `否`/`不` is also understood.
pub(crate) fn parse_verdict(metric: &str, reply: &str) -> Result<bool> {
    let trimmed = reply.trim();
    for word in trimmed.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        match word.to_lowercase().as_str() {
            "yes" | "true" => return Ok(true),
            "no" | "false" => return Ok(false),
            _ => {}
        }
    }

    match trimmed.trim_start_matches(|c: char| !c.is_alphanumeric()).chars().next() {
        Some('是') => Ok(true),
        Some('否' | '不') => Ok(false),
        _ => Err(EvalError::metric(metric, format!("unrecognised verdict: {trimmed:?}"))),
    }
}

/// Join retrieved contexts into one numbered block for judge prompts.
pub(crate) fn join_contexts(contexts: &[String]) -> String {
    contexts
        .iter()
        .enumerate()
        .map(|(i, context)| format!("[{}] {}", i + 1, context.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
