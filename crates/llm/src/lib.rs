//! LLM integration over the local Ollama endpoint
//!
//! Features:
//! - Streaming chat generation with reasoning/answer tagging
//! - Black-box intent scoring with a dedicated router model
//! - Retry with exponential backoff for transient failures

pub mod backend;
pub mod prompt;
pub mod router;

pub use backend::{LlmConfig, OllamaClient};
pub use prompt::PromptBuilder;
pub use router::OllamaIntentModel;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for pocket_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => pocket_core::Error::Timeout,
            other => pocket_core::Error::Llm(other.to_string()),
        }
    }
}
