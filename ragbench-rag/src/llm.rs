//! Language model provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// A text-completion backend.
///
/// The query engine calls [`complete`](LanguageModel::complete) exactly once
/// per question and never retries; outages surface to the caller as
/// [`RagError::ExternalProvider`](crate::RagError::ExternalProvider).
///
/// # Example
///
/// ```rust,ignore
/// use ragbench_rag::LanguageModel;
///
/// let answer = model.complete("Question: what is RAG?\nAnswer:").await?;
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the given prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
