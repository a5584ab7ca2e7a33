//! Text embedding abstraction

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request to embed a batch of texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Embedding model identifier
    pub model: String,
    /// Texts to embed, one vector is returned per entry
    pub input: Vec<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
        }
    }
}

/// Embedding vectors, in the same order as the request input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// One vector per input text
    pub vectors: Vec<Vec<f32>>,
    /// Prompt tokens consumed
    pub prompt_tokens: usize,
}

/// Trait for providers that can embed text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;
}
