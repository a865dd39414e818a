//! Retrieval-augmented question answering.
//!
//! The [`RagQueryEngine`] retrieves the top-K chunks for a question, stuffs
//! them into a single prompt, calls the [`LanguageModel`] once and returns a
//! [`RagResponse`] binding the answer to the contexts it was generated from.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragbench_rag::{RagQueryEngine, Retriever};
//!
//! let engine = RagQueryEngine::builder()
//!     .retriever(Retriever::new(index, 4)?)
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! let response = engine.query("What is RAG?").await?;
//! println!("{}", response.answer);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::llm::LanguageModel;
use crate::retriever::Retriever;

/// Placeholder replaced by the joined context texts.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Placeholder replaced by the question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

const DEFAULT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:";

/// Separator placed between context texts in the prompt.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// A prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if either placeholder is missing.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(RagError::Configuration(format!(
                    "prompt template must contain {placeholder}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Render the prompt for `question` over the given contexts.
    ///
    /// Placeholders are substituted in a single pass over the template, so
    /// placeholder-like text inside a context or the question stays literal.
    pub fn render(&self, contexts: &[String], question: &str) -> String {
        let context = contexts.join(CONTEXT_SEPARATOR);
        let substitutions = [(CONTEXT_PLACEHOLDER, context.as_str()), (QUESTION_PLACEHOLDER, question)];

        let mut prompt = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        while let Some((pos, placeholder, value)) = substitutions
            .iter()
            .filter_map(move |&(placeholder, value)| rest.find(placeholder).map(|pos| (pos, placeholder, value)))
            .min_by_key(|&(pos, ..)| pos)
        {
            prompt.push_str(&rest[..pos]);
            prompt.push_str(value);
            rest = &rest[pos + placeholder.len()..];
        }
        prompt.push_str(rest);
        prompt
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

/// The answer to a question together with the contexts it was generated from.
///
/// `contexts[i] == source_chunks[i].text` for every `i`, in retrieval-rank order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagResponse {
    /// The question as asked.
    pub question: String,
    /// Text returned by the language model.
    pub answer: String,
    /// Retrieved chunk texts, best-first.
    pub contexts: Vec<String>,
    /// Retrieved chunks, best-first.
    pub source_chunks: Vec<Chunk>,
}

/// Retrieval-augmented query engine. Construct one via [`RagQueryEngine::builder()`].
pub struct RagQueryEngine {
    retriever: Retriever,
    language_model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
}

impl RagQueryEngine {
    /// Create a new [`RagQueryEngineBuilder`].
    pub fn builder() -> RagQueryEngineBuilder {
        RagQueryEngineBuilder::default()
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer `question`: retrieve → build prompt → complete.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyInput`] if `question` is blank.
    /// - Any retrieval error (e.g. [`RagError::Uninitialized`] on an empty index).
    /// - [`RagError::ExternalProvider`] from the embedding provider or the
    ///   language model, unchanged and without retry.
    pub async fn query(&self, question: &str) -> Result<RagResponse> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyInput("question must not be blank".to_string()));
        }

        let results = self.retriever.retrieve(question).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            e
        })?;

        let source_chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
        let contexts: Vec<String> = source_chunks.iter().map(|c| c.text.clone()).collect();

        let prompt = self.template.render(&contexts, question);
        let answer = self.language_model.complete(&prompt).await.map_err(|e| {
            error!(error = %e, "language model call failed");
            e
        })?;

        info!(context_count = contexts.len(), answer_len = answer.len(), "query completed");

        Ok(RagResponse { question: question.to_string(), answer, contexts, source_chunks })
    }
}

/// Builder for constructing a [`RagQueryEngine`].
///
/// `retriever` and `language_model` are required; the prompt template
/// defaults to [`PromptTemplate::default`].
#[derive(Default)]
pub struct RagQueryEngineBuilder {
    retriever: Option<Retriever>,
    language_model: Option<Arc<dyn LanguageModel>>,
    template: Option<PromptTemplate>,
}

impl RagQueryEngineBuilder {
    /// Set the retriever.
    pub fn retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Override the prompt template.
    pub fn template(mut self, template: PromptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Build the [`RagQueryEngine`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if any required field is missing.
    pub fn build(self) -> Result<RagQueryEngine> {
        let retriever = self
            .retriever
            .ok_or_else(|| RagError::Configuration("retriever is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::Configuration("language_model is required".to_string()))?;

        Ok(RagQueryEngine {
            retriever,
            language_model,
            template: self.template.unwrap_or_default(),
        })
    }
}
