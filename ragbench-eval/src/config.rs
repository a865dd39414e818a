//! Evaluator configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::metrics::DEFAULT_STRICTNESS;

/// Settings for an [`Evaluator`](crate::Evaluator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum number of samples queried or scored at once. Results keep
    /// sample order whatever the value.
    pub concurrency: usize,
    /// Questions generated per answer by the answer relevancy metric.
    pub answer_relevancy_strictness: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { concurrency: 1, answer_relevancy_strictness: DEFAULT_STRICTNESS }
    }
}

impl EvalConfig {
    /// Check that every field is in range.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::Configuration`] if `concurrency` or
    /// `answer_relevancy_strictness` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(EvalError::Configuration("concurrency must be greater than 0".into()));
        }
        if self.answer_relevancy_strictness == 0 {
            return Err(EvalError::Configuration(
                "answer_relevancy_strictness must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
