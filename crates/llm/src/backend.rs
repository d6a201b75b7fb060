//! Ollama backend
//!
//! Streams chat completions from a local Ollama server. Reasoning-capable
//! models (qwen3 and friends) return their chain of thought in a separate
//! `thinking` field per chunk; it is surfaced as reasoning-tagged deltas
//! so the caller can display it without speaking it.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use pocket_core::{
    GenerateRequest, GenerateResponse, LanguageModel, Result as CoreResult, TokenDelta,
};

use crate::LlmError;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name
    pub model: String,
    /// API endpoint
    pub endpoint: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Keep model loaded in memory between calls ("5m", "1h", "-1", "0")
    pub keep_alive: String,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
    /// Request the model's reasoning stream where supported
    pub think: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:1.7b".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            max_tokens: 512,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            keep_alive: "5m".to_string(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            think: true,
        }
    }
}

/// Ollama client
#[derive(Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Build the API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    fn build_request(&self, request: &GenerateRequest, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                    thinking: None,
                })
                .collect(),
            stream,
            options: Some(OllamaOptions {
                temperature: request.temperature.or(Some(self.config.temperature)),
                num_predict: Some(request.max_tokens.unwrap_or(self.config.max_tokens) as i32),
            }),
            keep_alive: Some(self.config.keep_alive.clone()),
            think: Some(self.config.think),
        }
    }

    /// Execute a single non-streaming request (used by the retry loop)
    async fn execute_request(
        &self,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!(
                    "Server error {}: {}",
                    status, error
                )));
            }
            return Err(LlmError::Api(error));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    /// Check if an error is retryable
    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    /// Generate a response with retry for transient failures
    async fn generate(&self, request: GenerateRequest) -> CoreResult<GenerateResponse> {
        let request = self.build_request(&request, false);

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "LLM request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.config.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request).await {
                Ok(result) => {
                    return Ok(GenerateResponse {
                        text: result.message.content,
                        tokens: result.eval_count.unwrap_or(0) as usize,
                    });
                }
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string()))
            .into())
    }

    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = CoreResult<TokenDelta>> + Send + 'a>> {
        let body = self.build_request(&request, true);

        Box::pin(async_stream::try_stream! {
            let response = self
                .client
                .post(self.api_url("/chat"))
                .json(&body)
                .send()
                .await
                .map_err(LlmError::from)?;

            if !response.status().is_success() {
                let error = response.text().await.unwrap_or_default();
                Err::<(), LlmError>(LlmError::Api(error))?;
                return;
            }

            let mut stream = response.bytes_stream();
            // NDJSON lines can split across network chunks; buffer partials.
            let mut buffer = String::new();
            let mut finished = false;

            'network: while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(LlmError::from)?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer.drain(..=line_end);

                    if line.is_empty() {
                        continue;
                    }

                    let parsed: OllamaStreamChunk = serde_json::from_str(&line)
                        .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

                    if let Some(thinking) = parsed.message.thinking {
                        if !thinking.is_empty() {
                            yield TokenDelta::reasoning(thinking);
                        }
                    }
                    if !parsed.message.content.is_empty() {
                        yield TokenDelta::text(parsed.message.content);
                    }
                    if parsed.done {
                        finished = true;
                        break 'network;
                    }
                }
            }

            if !finished {
                tracing::debug!("Ollama stream ended without a done marker");
            }
            yield TokenDelta::final_delta();
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.config.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    /// Reasoning stream toggle for models like qwen3/deepseek-r1
    #[serde(skip_serializing_if = "Option::is_none")]
    think: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    /// Reasoning tokens, populated by thinking-capable models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thinking: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[allow(dead_code)]
    done: bool,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    message: OllamaMessage,
    done: bool,
}
