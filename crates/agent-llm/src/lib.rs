//! LLM provider abstraction layer
//!
//! This crate provides provider-agnostic abstractions for talking to Large
//! Language Models:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - [`LLMProvider`] for chat completions
//! - [`EmbeddingProvider`] for text embeddings (used by filing retrieval)
//! - Concrete provider implementations (behind feature flags)

pub mod completion;
pub mod embedding;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(any(feature = "openai", feature = "anthropic"))]
pub mod providers;
