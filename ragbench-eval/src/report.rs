//! Plain-text evaluation reports.

use crate::metrics::{ANSWER_RELEVANCY, CONTEXT_PRECISION, CONTEXT_RECALL, FAITHFULNESS};
use crate::result::EvaluationResult;

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "----------------------------------------";

/// Qualitative reading of an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityBand {
    /// `>= 0.8`
    Excellent,
    /// `>= 0.6`
    Good,
    /// `>= 0.4`
    Fair,
    NeedsImprovement,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Excellent
        } else if score >= 0.6 {
            Self::Good
        } else if score >= 0.4 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs improvement",
        }
    }

    fn summary(self) -> &'static str {
        match self {
            Self::Excellent => "the RAG system performs well across all metrics.",
            Self::Good => "the RAG system performs well, with room for improvement.",
            Self::Fair => "consider tuning retrieval and generation.",
            Self::NeedsImprovement => "retrieval and generation need significant work.",
        }
    }
}

fn describe(metric: &str) -> (&'static str, &'static str) {
    match metric {
        FAITHFULNESS => ("Faithfulness", "consistency of the answer with the retrieved contexts"),
        ANSWER_RELEVANCY => ("Answer Relevancy", "how directly the answer addresses the question"),
        CONTEXT_PRECISION => ("Context Precision", "whether useful contexts are ranked first"),
        CONTEXT_RECALL => ("Context Recall", "coverage of the reference answer by the contexts"),
        _ => ("", ""),
    }
}

/// Render `result` as a report.
///
/// Lists each core metric by display name and key with its value to four
/// decimal places, then any additional metrics, the overall score (mean of
/// the core metrics) and its [`QualityBand`]. The output depends only on the
/// scores and sample count, so equal results render identically.
pub fn render_report(result: &EvaluationResult) -> String {
    let overall = result.overall();
    let band = QualityBand::from_score(overall);

    let mut lines = vec![
        HEAVY_RULE.to_string(),
        "RAG Evaluation Report".to_string(),
        HEAVY_RULE.to_string(),
        String::new(),
        format!("Samples evaluated: {}", result.sample_count),
        String::new(),
        "Metrics".to_string(),
        LIGHT_RULE.to_string(),
    ];

    for (metric, score) in result.core_scores() {
        let (title, description) = describe(metric);
        lines.push(format!("{title} ({metric}): {score:.4}"));
        lines.push(format!("  - {description}"));
        lines.push(String::new());
    }
    for (metric, score) in &result.additional {
        lines.push(format!("{metric}: {score:.4}"));
        lines.push(String::new());
    }

    lines.extend([
        LIGHT_RULE.to_string(),
        format!("Overall score: {overall:.4}"),
        String::new(),
        "Assessment".to_string(),
        LIGHT_RULE.to_string(),
        format!("{}: {}", band.label(), band.summary()),
        String::new(),
        HEAVY_RULE.to_string(),
    ]);
    lines.join("\n")
}
