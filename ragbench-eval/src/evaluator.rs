//! The evaluation driver.
//!
//! An [`Evaluator`] walks a dataset through the RAG engine and the metric
//! set:
//!
//! ```text
//! Idle → DatasetLoaded → DataPrepared → Evaluated → ReportGenerated
//! ```
//!
//! Each step takes the previous step's output explicitly; [`Evaluator::run`]
//! performs all four.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragbench_eval::Evaluator;
//!
//! let mut evaluator = Evaluator::builder()
//!     .engine(Arc::new(engine))
//!     .judge(judge_model, embedder)
//!     .build()?;
//!
//! let (result, report) = evaluator.run("eval_dataset.json").await?;
//! println!("{report}");
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use futures::{StreamExt, TryStreamExt, stream};
use ragbench_rag::{EmbeddingProvider, LanguageModel, RagQueryEngine};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::EvalConfig;
use crate::dataset::{self, EvaluationSample};
use crate::error::{EvalError, Result};
use crate::metrics::{
    ANSWER_RELEVANCY, CONTEXT_PRECISION, CONTEXT_RECALL, FAITHFULNESS, MetricSet,
};
use crate::report::render_report;
use crate::result::{EvaluationBatch, EvaluationRecord, EvaluationResult, SampleScores};

/// The last step an [`Evaluator`] completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluatorState {
    #[default]
    Idle,
    DatasetLoaded,
    DataPrepared,
    Evaluated,
    ReportGenerated,
}

/// Runs a [`RagQueryEngine`] over a dataset and scores the answers.
/// Construct one via [`Evaluator::builder()`].
pub struct Evaluator {
    engine: Arc<RagQueryEngine>,
    metrics: MetricSet,
    config: EvalConfig,
    state: EvaluatorState,
}

impl Evaluator {
    /// Create a new [`EvaluatorBuilder`].
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::default()
    }

    pub fn state(&self) -> EvaluatorState {
        self.state
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    fn transition(&mut self, next: EvaluatorState) {
        debug!(from = ?self.state, to = ?next, "evaluator state transition");
        self.state = next;
    }

    /// Load and validate the dataset at `path`.
    ///
    /// # Errors
    ///
    /// See [`dataset::load_dataset`].
    pub async fn load_dataset(&mut self, path: impl AsRef<Path>) -> Result<Vec<EvaluationSample>> {
        let samples = dataset::load_dataset(path).await?;
        self.transition(EvaluatorState::DatasetLoaded);
        Ok(samples)
    }

    /// Ask the engine every sample's question and pair the answers with the
    /// ground truth, in sample order.
    ///
    /// # Errors
    ///
    /// - [`EvalError::EmptyInput`] if `samples` is empty.
    /// - [`EvalError::Rag`] if any query fails; provider failures are not
    ///   retried.
    pub async fn prepare_data(&mut self, samples: &[EvaluationSample]) -> Result<EvaluationBatch> {
        if samples.is_empty() {
            return Err(EvalError::EmptyInput(
                "cannot prepare evaluation data: samples list is empty".to_string(),
            ));
        }

        let engine = &self.engine;
        let records: Vec<EvaluationRecord> = stream::iter(samples.iter().enumerate())
            .map(|(i, sample)| async move {
                let response = engine.query(&sample.question).await.map_err(|e| {
                    error!(sample = i, error = %e, "query failed while preparing evaluation data");
                    EvalError::from(e)
                })?;
                Ok::<_, EvalError>(EvaluationRecord::from_response(sample, response))
            })
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;

        info!(sample_count = records.len(), "prepared evaluation data");
        self.transition(EvaluatorState::DataPrepared);
        Ok(EvaluationBatch::new(records))
    }

    /// Score every record with every metric and average per metric.
    ///
    /// A metric that fails, or returns `NaN` or an infinite value, scores
    /// `0.0` for that sample; other scores are clamped to `[0, 1]`. The four
    /// core metrics default to `0.0` when absent from the metric set.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::EmptyInput`] if `batch` is empty.
    pub async fn evaluate(&mut self, batch: &EvaluationBatch) -> Result<EvaluationResult> {
        if batch.is_empty() {
            return Err(EvalError::EmptyInput("cannot evaluate an empty batch".to_string()));
        }

        let metrics = &self.metrics;
        let per_sample: Vec<SampleScores> = stream::iter(batch.records().iter().enumerate())
            .map(|(i, record)| score_record(metrics, i, record))
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut means = BTreeMap::new();
        for name in metrics.names() {
            let total: f64 = per_sample.iter().filter_map(|s| s.scores.get(name)).sum();
            means.insert(name.to_string(), total / per_sample.len() as f64);
        }

        let mut take = |name: &str| means.remove(name).unwrap_or(0.0);
        let result = EvaluationResult {
            run_id: Uuid::new_v4(),
            faithfulness: take(FAITHFULNESS),
            answer_relevancy: take(ANSWER_RELEVANCY),
            context_precision: take(CONTEXT_PRECISION),
            context_recall: take(CONTEXT_RECALL),
            additional: means,
            sample_count: per_sample.len(),
            per_sample,
            evaluated_at: Utc::now(),
        };

        info!(
            run_id = %result.run_id,
            sample_count = result.sample_count,
            faithfulness = result.faithfulness,
            answer_relevancy = result.answer_relevancy,
            context_precision = result.context_precision,
            context_recall = result.context_recall,
            "evaluation completed"
        );
        self.transition(EvaluatorState::Evaluated);
        Ok(result)
    }

    /// Render `result` as a report. See [`render_report`].
    pub fn generate_report(&mut self, result: &EvaluationResult) -> String {
        let report = render_report(result);
        self.transition(EvaluatorState::ReportGenerated);
        report
    }

    /// Load, prepare, evaluate and report in one call.
    ///
    /// # Errors
    ///
    /// Any error of the individual steps.
    pub async fn run(&mut self, dataset_path: impl AsRef<Path>) -> Result<(EvaluationResult, String)> {
        let samples = self.load_dataset(dataset_path).await?;
        let batch = self.prepare_data(&samples).await?;
        let result = self.evaluate(&batch).await?;
        let report = self.generate_report(&result);
        Ok((result, report))
    }
}

async fn score_record(metrics: &MetricSet, index: usize, record: &EvaluationRecord) -> SampleScores {
    let mut scores = BTreeMap::new();
    for metric in metrics.iter() {
        let name = metric.name();
        let score = match metric.score(record).await {
            Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
            Ok(score) => {
                debug!(metric = name, sample = index, score, "non-finite score recorded as 0");
                0.0
            }
            Err(e) => {
                warn!(metric = name, sample = index, error = %e, "metric failed, recording 0");
                0.0
            }
        };
        scores.insert(name.to_string(), score);
    }
    SampleScores { record: record.clone(), scores }
}

/// Builder for constructing an [`Evaluator`].
#[derive(Default)]
pub struct EvaluatorBuilder {
    engine: Option<Arc<RagQueryEngine>>,
    metrics: Option<MetricSet>,
    judge: Option<(Arc<dyn LanguageModel>, Arc<dyn EmbeddingProvider>)>,
    config: EvalConfig,
}

impl EvaluatorBuilder {
    /// Set the engine under evaluation.
    pub fn engine(mut self, engine: Arc<RagQueryEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the metrics to compute.
    pub fn metrics(mut self, metrics: MetricSet) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Use the standard metrics ([`MetricSet::ragas`]) judged by `llm`,
    /// with the strictness from the config. Ignored when
    /// [`metrics`](Self::metrics) is set.
    pub fn judge(mut self, llm: Arc<dyn LanguageModel>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.judge = Some((llm, embedder));
        self
    }

    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the [`Evaluator`].
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Configuration`] if the engine is missing, neither
    /// metrics nor a judge were given, the metric set is empty, or the
    /// config is invalid.
    pub fn build(self) -> Result<Evaluator> {
        self.config.validate()?;
        let engine =
            self.engine.ok_or_else(|| EvalError::Configuration("engine is required".to_string()))?;
        let strictness = self.config.answer_relevancy_strictness;
        let metrics = self
            .metrics
            .or_else(|| self.judge.map(|(llm, embedder)| MetricSet::ragas(llm, embedder, strictness)))
            .filter(|m| !m.is_empty())
            .ok_or_else(|| EvalError::Configuration("at least one metric is required".to_string()))?;

        Ok(Evaluator { engine, metrics, config: self.config, state: EvaluatorState::Idle })
    }
}
