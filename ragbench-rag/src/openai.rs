//! OpenAI-compatible embedding and chat providers.
//!
//! This module is only available when the `openai` feature is enabled.
//! Both providers take an explicit [`OpenAIConfig`], so several providers
//! pointing at different endpoints or models can coexist in one process.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::LanguageModel;

/// The default OpenAI API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for an OpenAI-compatible API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`. `None` means the OpenAI default.
    pub base_url: Option<String>,
    /// Model name passed in each request body.
    pub model: String,
}

impl OpenAIConfig {
    /// Create a config for the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: None, model: model.into() }
    }

    /// Point the config at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Read `OPENAI_API_KEY` and the optional `OPENAI_BASE_URL` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `OPENAI_API_KEY` is not set.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::Configuration("OPENAI_API_KEY environment variable not set".into())
        })?;
        let base_url = std::env::var("OPENAI_BASE_URL").ok().filter(|v| !v.trim().is_empty());
        Ok(Self { api_key, base_url, model: model.into() })
    }

    fn validate(&self, provider: &str) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(RagError::Configuration(format!("{provider}: API key must not be empty")));
        }
        if self.model.trim().is_empty() {
            return Err(RagError::Configuration(format!("{provider}: model must not be empty")));
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/{path}", base.trim_end_matches('/'))
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
    client: &reqwest::Client,
    config: &OpenAIConfig,
    provider: &str,
    path: &str,
    body: &Req,
) -> Result<Resp> {
    let response = client
        .post(config.endpoint(path))
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!(provider, error = %e, "request failed");
            RagError::provider(provider, format!("request failed: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);

        error!(provider, %status, "API error");
        return Err(RagError::provider(provider, format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(provider, error = %e, "failed to parse response");
        RagError::provider(provider, format!("failed to parse response: {e}"))
    })
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use ragbench_rag::openai::{OpenAIConfig, OpenAIEmbeddingProvider};
///
/// let config = OpenAIConfig::from_env("text-embedding-3-small")?;
/// let provider = OpenAIEmbeddingProvider::new(config, 1536)?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    config: OpenAIConfig,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    const PROVIDER: &'static str = "OpenAI embeddings";

    /// Create a provider whose model produces `dimensions`-long vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if the API key or model is empty.
    pub fn new(config: OpenAIConfig, dimensions: usize) -> Result<Self> {
        config.validate(Self::PROVIDER)?;
        Ok(Self { client: reqwest::Client::new(), config, dimensions, request_dimensions: None })
    }

    /// Ask the API to truncate embeddings to `dims` (Matryoshka models).
    pub fn with_requested_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = Self::PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::provider(Self::PROVIDER, "API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = Self::PROVIDER,
            batch_size = texts.len(),
            model = %self.config.model,
            "embedding batch"
        );

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };
        let mut response: EmbeddingResponse =
            post_json(&self.client, &self.config, Self::PROVIDER, "embeddings", &request).await?;

        // The API may return items out of order; `index` restores input order.
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`LanguageModel`] backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// Each prompt is sent as a single user message with temperature 0.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIChatModel {
    const PROVIDER: &'static str = "OpenAI chat";

    /// Create a chat model client.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if the API key or model is empty.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        config.validate(Self::PROVIDER)?;
        Ok(Self { client: reqwest::Client::new(), config })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = Self::PROVIDER, model = %self.config.model, prompt_len = prompt.len(), "completing prompt");

        let request = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: 0.0,
        };
        let response: ChatResponse =
            post_json(&self.client, &self.config, Self::PROVIDER, "chat/completions", &request)
                .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagError::provider(Self::PROVIDER, "API returned no completion"))
    }
}
