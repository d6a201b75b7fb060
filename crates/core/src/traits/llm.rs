//! Language model and intent model traits

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::{GenerateRequest, ModelPrediction, Result, TokenDelta, Turn};

/// Language Model interface for the chat backend.
///
/// Implementations:
/// - `OllamaClient` - local Ollama inference over HTTP
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a complete response
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Stream token deltas as they are generated.
    ///
    /// Lower latency than `generate()`; deltas are tagged reasoning or
    /// answer so the caller can route them differently.
    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<TokenDelta>> + Send + 'a>>;

    /// Check if the model endpoint is reachable and the model is loaded
    async fn is_available(&self) -> bool;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Complete (non-streamed) generation result
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Tokens generated, when the backend reports it
    pub tokens: usize,
}

impl GenerateResponse {
    /// Create a simple text response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            tokens: 0,
        }
    }
}

/// Black-box intent scoring function.
///
/// The pipeline consumes a pre-trained classifier; it never trains one.
/// Every failure is surfaced as an error so the classifier can degrade to
/// the chat fallback instead of guessing.
#[async_trait]
pub trait IntentModel: Send + Sync + 'static {
    /// Score the utterance (with an optional short history window) and
    /// return the top label.
    async fn score(&self, text: &str, history: &[Turn]) -> Result<ModelPrediction>;

    /// Check if the model is loaded and reachable
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct MockLlm;

    #[async_trait]
    impl LanguageModel for MockLlm {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            Ok(GenerateResponse::text("Mock response"))
        }

        fn generate_stream<'a>(
            &'a self,
            _request: GenerateRequest,
        ) -> Pin<Box<dyn Stream<Item = Result<TokenDelta>> + Send + 'a>> {
            Box::pin(futures::stream::iter(vec![
                Ok(TokenDelta::text("Mock")),
                Ok(TokenDelta::final_delta()),
            ]))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock-llm"
        }
    }

    struct FailingIntentModel;

    #[async_trait]
    impl IntentModel for FailingIntentModel {
        async fn score(&self, _text: &str, _history: &[Turn]) -> Result<ModelPrediction> {
            Err(Error::Unavailable("model not loaded".to_string()))
        }

        async fn is_available(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_mock_llm() {
        let llm = MockLlm;
        assert!(llm.is_available().await);
        assert_eq!(llm.model_name(), "mock-llm");

        let request = GenerateRequest::new("Test").with_user_message("Hello");
        let response = llm.generate(request).await.unwrap();
        assert_eq!(response.text, "Mock response");
    }

    #[tokio::test]
    async fn test_failing_intent_model_reports_error() {
        let model = FailingIntentModel;
        assert!(!model.is_available().await);
        assert!(model.score("anything", &[]).await.is_err());
    }
}
