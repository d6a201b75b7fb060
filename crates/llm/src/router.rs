//! Intent model over the Ollama endpoint
//!
//! Consumes the fine-tuned router model as a black-box scoring function.
//! The model is asked for a bare label; anything that does not parse as a
//! known intent is an error so the classifier can fall back to chat
//! instead of guessing.

use async_trait::async_trait;

use pocket_core::{
    Error, GenerateRequest, Intent, IntentModel, LanguageModel, ModelPrediction,
    Result as CoreResult, Turn,
};

use crate::backend::{LlmConfig, OllamaClient};
use crate::LlmError;

const ROUTER_SYSTEM_PROMPT: &str = "You are an intent router for a desktop assistant. \
     Classify the user's request into exactly one of: chat, home, planner, briefing, web. \
     Reply with the single label only.";

/// How many history turns the router model sees
const ROUTER_HISTORY_WINDOW: usize = 4;

/// Ollama-backed intent model
pub struct OllamaIntentModel {
    client: OllamaClient,
    model: String,
}

impl OllamaIntentModel {
    /// Create a router using the given endpoint configuration.
    ///
    /// The router runs with temperature 0 and a short token budget; the
    /// reasoning stream is disabled for latency.
    pub fn new(mut config: LlmConfig, model: impl Into<String>) -> Result<Self, LlmError> {
        let model = model.into();
        config.think = false;
        config.temperature = 0.0;
        let client = OllamaClient::new(config)?;
        Ok(Self { client, model })
    }

    fn build_request(&self, text: &str, history: &[Turn]) -> GenerateRequest {
        let mut request = GenerateRequest::new(ROUTER_SYSTEM_PROMPT)
            .with_model(&self.model)
            .with_temperature(0.0)
            .with_max_tokens(8);

        let skip = history.len().saturating_sub(ROUTER_HISTORY_WINDOW);
        for turn in &history[skip..] {
            request = request.with_message(pocket_core::Message {
                role: match turn.role {
                    pocket_core::TurnRole::Assistant => pocket_core::Role::Assistant,
                    _ => pocket_core::Role::User,
                },
                content: turn.content.clone(),
            });
        }

        request.with_user_message(text)
    }

    /// Parse the model's reply into a prediction.
    ///
    /// An exact label scores 1.0; a label buried in extra text scores
    /// lower; no label at all is an error.
    fn parse_reply(reply: &str) -> CoreResult<ModelPrediction> {
        let trimmed = reply.trim().trim_matches(|c: char| !c.is_alphanumeric());

        if Intent::from_label(trimmed).is_some() {
            return Ok(ModelPrediction {
                label: trimmed.to_lowercase(),
                score: 1.0,
            });
        }

        let lower = reply.to_lowercase();
        for intent in Intent::ALL {
            if lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == intent.as_str())
            {
                return Ok(ModelPrediction {
                    label: intent.as_str().to_string(),
                    score: 0.5,
                });
            }
        }

        Err(Error::Llm(format!(
            "Router reply did not contain a known label: {:?}",
            reply
        )))
    }
}

#[async_trait]
impl IntentModel for OllamaIntentModel {
    async fn score(&self, text: &str, history: &[Turn]) -> CoreResult<ModelPrediction> {
        let request = self.build_request(text, history);
        let response = self.client.generate(request).await?;

        let prediction = Self::parse_reply(&response.text)?;
        tracing::debug!(
            label = %prediction.label,
            score = prediction.score,
            "Router model prediction"
        );
        Ok(prediction)
    }

    async fn is_available(&self) -> bool {
        self.client.is_available().await
    }
}
