use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::AiHandler;
use super::types::{ChatResponse, FinishReason, Usage};
use crate::config::types::Settings;
use crate::error::{GenerationError, PrSuggestError};

/// Seconds to wait when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Where and how to call a chat completions endpoint.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL; `/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.openai.api_base.clone(),
            model: settings.config.model.clone(),
            temperature: settings.config.temperature,
            max_tokens: settings.config.max_tokens,
            api_key: settings.openai.key.clone(),
            timeout: Duration::from_secs(settings.config.ai_timeout),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &if self.api_key.is_empty() { "[]" } else { "[REDACTED]" })
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// OpenAI-compatible chat completions handler.
///
/// Works with Groq, OpenAI, Ollama, DeepSeek, OpenRouter and any other
/// provider exposing `/chat/completions`.
pub struct OpenAiCompatibleHandler {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiCompatibleHandler {
    pub fn new(config: ProviderConfig) -> Result<Self, PrSuggestError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(PrSuggestError::Http)?;
        Ok(Self { client, config })
    }

    /// Create a handler from `[config]` and `[openai]`.
    pub fn from_settings(settings: &Settings) -> Result<Self, PrSuggestError> {
        Self::new(ProviderConfig::from_settings(settings))
    }

    fn build_request_body(&self, system: &str, user: &str) -> serde_json::Value {
        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": user}));

        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    /// Send a single request and parse the response.
    async fn send_completion(&self, body: &serde_json::Value) -> Result<ChatResponse, GenerationError> {
        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));

        let mut req = self.client.post(&url).json(body);
        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            if status.as_u16() == 429 {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(GenerationError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }

            let body_text = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => GenerationError::Auth {
                    status: status.as_u16(),
                    message: body_text,
                },
                _ => GenerationError::Provider(format!("API returned {status}: {body_text}")),
            });
        }

        let text = resp.text().await?;
        let api_resp: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Provider(format!("malformed response body: {e}")))?;

        let choice = api_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Provider("no choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from)
            .unwrap_or_default();
        let usage = api_resp.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl AiHandler for OpenAiCompatibleHandler {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat_completion(&self, system: &str, user: &str) -> Result<ChatResponse, GenerationError> {
        let body = self.build_request_body(system, user);
        tracing::debug!(model = %self.config.model, prompt_chars = user.len(), "sending chat completion");
        self.send_completion(&body).await
    }
}

// ── API response types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
