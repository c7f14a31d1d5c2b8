use async_trait::async_trait;

use super::types::CompletionRequest;
use crate::core::errors::ProviderError;

/// Text-completion capability. The pipeline treats it as an opaque,
/// possibly slow, possibly failing function; timeouts are enforced by callers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// chat completion (non-streaming)
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// Embedding capability. Must be deterministic for identical input and return
/// vectors of one fixed dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}
