//! Evaluation dataset loading and validation.
//!
//! A dataset is a JSON document of the form:
//!
//! ```json
//! {
//!   "samples": [
//!     { "question": "...", "ground_truth": "...", "contexts": ["optional", "..."] }
//!   ]
//! }
//! ```
//!
//! `groundTruth` is accepted as an alias for `ground_truth`. Validation scans
//! samples in order and fields in a fixed order within each sample, so the
//! same invalid file always reports the same first violation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{EvalError, Result};

const SAMPLES_KEY: &str = "samples";
const QUESTION_KEY: &str = "question";
const GROUND_TRUTH_KEY: &str = "ground_truth";
const GROUND_TRUTH_ALIAS: &str = "groundTruth";
const CONTEXTS_KEY: &str = "contexts";

/// One labelled question of an evaluation dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSample {
    /// The question put to the RAG engine.
    pub question: String,
    /// The reference answer.
    #[serde(alias = "groundTruth")]
    pub ground_truth: String,
    /// Optional reference contexts supplied with the sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contexts: Option<Vec<String>>,
}

impl EvaluationSample {
    /// Create a sample without reference contexts.
    pub fn new(question: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self { question: question.into(), ground_truth: ground_truth.into(), contexts: None }
    }

    /// Attach reference contexts.
    pub fn with_contexts(mut self, contexts: Vec<String>) -> Self {
        self.contexts = Some(contexts);
        self
    }
}

/// Read and validate the dataset at `path`.
///
/// # Errors
///
/// - [`EvalError::NotFound`] if `path` does not exist.
/// - [`EvalError::Parse`] if the file is not valid JSON.
/// - [`EvalError::Schema`] if the JSON does not match the dataset layout;
///   the message names the offending field and sample index.
pub async fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<EvaluationSample>> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await? {
        return Err(EvalError::NotFound(format!(
            "evaluation dataset file not found: {}",
            path.display()
        )));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let samples = parse_dataset(&content)?;
    info!(path = %path.display(), sample_count = samples.len(), "loaded evaluation dataset");
    Ok(samples)
}

/// Validate a dataset held in memory.
///
/// # Errors
///
/// Same as [`load_dataset`], minus [`EvalError::NotFound`].
pub fn parse_dataset(content: &str) -> Result<Vec<EvaluationSample>> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| EvalError::Parse(format!("invalid JSON in evaluation dataset: {e}")))?;

    let Value::Object(root) = document else {
        return Err(schema("expected a JSON object with 'samples' key"));
    };
    let Some(samples) = root.get(SAMPLES_KEY) else {
        return Err(schema("missing 'samples' key"));
    };
    let Value::Array(samples) = samples else {
        return Err(schema("'samples' must be a list"));
    };
    if samples.is_empty() {
        return Err(schema("'samples' list has no items"));
    }

    let parsed = samples
        .iter()
        .enumerate()
        .map(|(i, value)| parse_sample(i, value))
        .collect::<Result<Vec<_>>>()?;

    debug!(sample_count = parsed.len(), "validated evaluation dataset");
    Ok(parsed)
}

fn parse_sample(index: usize, value: &Value) -> Result<EvaluationSample> {
    let Value::Object(fields) = value else {
        return Err(sample_error(index, "expected a JSON object"));
    };

    let question = fields
        .get(QUESTION_KEY)
        .ok_or_else(|| sample_error(index, "missing 'question' field"))?;
    let ground_truth = fields
        .get(GROUND_TRUTH_KEY)
        .or_else(|| fields.get(GROUND_TRUTH_ALIAS))
        .ok_or_else(|| sample_error(index, "missing 'ground_truth' field"))?;

    let question = non_blank_string(question)
        .ok_or_else(|| sample_error(index, "'question' must be a non-empty string"))?;
    let ground_truth = non_blank_string(ground_truth)
        .ok_or_else(|| sample_error(index, "'ground_truth' must be a non-empty string"))?;
    let contexts = parse_contexts(index, fields)?;

    Ok(EvaluationSample { question, ground_truth, contexts })
}

fn parse_contexts(index: usize, fields: &Map<String, Value>) -> Result<Option<Vec<String>>> {
    match fields.get(CONTEXTS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(j, item)| match item {
                Value::String(text) => Ok(text.clone()),
                _ => Err(sample_error(index, &format!("'contexts[{j}]' must be a string"))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(sample_error(index, "'contexts' must be a list")),
    }
}

fn non_blank_string(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string)
}

fn schema(message: &str) -> EvalError {
    EvalError::Schema(message.to_string())
}

fn sample_error(index: usize, message: &str) -> EvalError {
    EvalError::Schema(format!("samples[{index}]: {message}"))
}
