//! # ragbench-eval
//!
//! Evaluation harness for the `ragbench-rag` query engine.
//!
//! - [`load_dataset`] reads and strictly validates a JSON dataset of
//!   question / ground-truth samples
//! - [`Metric`] strategies score each answered sample; [`MetricSet::ragas`]
//!   provides faithfulness, answer relevancy, context precision and
//!   context recall judged by a [`LanguageModel`](ragbench_rag::LanguageModel)
//! - [`Evaluator`] drives the engine over the dataset, averages the scores
//!   into an [`EvaluationResult`] and renders a report
//!
//! # Example
//!
//! ```rust,ignore
//! use ragbench_eval::Evaluator;
//!
//! let mut evaluator = Evaluator::builder()
//!     .engine(engine)
//!     .judge(judge_model, embedder)
//!     .build()?;
//! let (result, report) = evaluator.run("eval_dataset.json").await?;
//! assert!(result.faithfulness <= 1.0);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod result;

pub use config::EvalConfig;
pub use dataset::{EvaluationSample, load_dataset, parse_dataset};
pub use error::{EvalError, Result};
pub use evaluator::{Evaluator, EvaluatorBuilder, EvaluatorState};
pub use metrics::{
    AnswerRelevancy, ContextPrecision, ContextRecall, Faithfulness, Metric, MetricSet,
};
pub use report::{QualityBand, render_report};
pub use result::{EvaluationBatch, EvaluationRecord, EvaluationResult, SampleScores};
