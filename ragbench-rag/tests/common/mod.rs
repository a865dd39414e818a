//! Deterministic in-process providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use ragbench_rag::{EmbeddingProvider, LanguageModel, RagError, Result};

/// Bag-of-words embeddings: each lowercase token is hashed into a bucket.
///
/// Texts sharing words point in similar directions, which makes rankings
/// predictable without a real model.
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An embedder whose every call fails.
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::provider("failing", "embedding service unavailable"))
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// An embedder that reports one dimensionality but returns another.
pub struct WrongSizeEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for WrongSizeEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; 3])
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// A language model returning a fixed answer and recording every prompt.
pub struct RecordingModel {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// A language model whose every call fails.
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(RagError::provider("unavailable", "model endpoint unreachable"))
    }
}
