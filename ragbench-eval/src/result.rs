//! Evaluation inputs and outputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ragbench_rag::RagResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dataset::EvaluationSample;
use crate::metrics::{ANSWER_RELEVANCY, CONTEXT_PRECISION, CONTEXT_RECALL, FAITHFULNESS};

/// A question answered by the RAG engine, paired with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub answer: String,
    /// Retrieved contexts, best-first.
    pub contexts: Vec<String>,
    pub ground_truth: String,
    /// Reference contexts carried over from the dataset, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_contexts: Option<Vec<String>>,
}

impl EvaluationRecord {
    /// Pair an engine response with the sample it answered.
    pub fn from_response(sample: &EvaluationSample, response: RagResponse) -> Self {
        Self {
            question: sample.question.clone(),
            answer: response.answer,
            contexts: response.contexts,
            ground_truth: sample.ground_truth.clone(),
            reference_contexts: sample.contexts.clone(),
        }
    }
}

/// The records of one evaluation run, in sample order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationBatch {
    records: Vec<EvaluationRecord>,
}

impl EvaluationBatch {
    pub fn new(records: Vec<EvaluationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EvaluationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<EvaluationRecord>> for EvaluationBatch {
    fn from(records: Vec<EvaluationRecord>) -> Self {
        Self::new(records)
    }
}

/// Scores for one sample, keyed by metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleScores {
    #[serde(flatten)]
    pub record: EvaluationRecord,
    /// Every metric's score for this sample, each in `[0, 1]`.
    pub scores: BTreeMap<String, f64>,
}

/// Dataset-level scores produced by the evaluator.
///
/// Each score is the arithmetic mean of the per-sample scores and lies in
/// `[0, 1]`. Samples where a metric failed count as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Identifier of the evaluation run.
    pub run_id: Uuid,
    pub faithfulness: f64,
    pub answer_relevancy: f64,
    pub context_precision: f64,
    pub context_recall: f64,
    /// Averages of metrics beyond the four core ones.
    #[serde(default)]
    pub additional: BTreeMap<String, f64>,
    pub per_sample: Vec<SampleScores>,
    pub sample_count: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// The four core metrics as `(name, score)` pairs, in report order.
    pub fn core_scores(&self) -> [(&'static str, f64); 4] {
        [
            (FAITHFULNESS, self.faithfulness),
            (ANSWER_RELEVANCY, self.answer_relevancy),
            (CONTEXT_PRECISION, self.context_precision),
            (CONTEXT_RECALL, self.context_recall),
        ]
    }

    /// Mean of the four core metrics.
    pub fn overall(&self) -> f64 {
        self.core_scores().iter().map(|(_, score)| score).sum::<f64>() / 4.0
    }

    /// Score of the named metric, core or additional.
    pub fn score(&self, metric: &str) -> Option<f64> {
        self.core_scores()
            .iter()
            .find(|(name, _)| *name == metric)
            .map(|(_, score)| *score)
            .or_else(|| self.additional.get(metric).copied())
    }
}
