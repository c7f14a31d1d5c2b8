use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::errors::ProviderError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] ProviderError),
}
