//! `OpenRouterProvider` - OpenAI-compatible chat completions over HTTP
//!
//! `TigerStyle`: Production provider, feature-gated behind `openai`.
//!
//! Talks to any `/chat/completions` endpoint. Defaults target OpenRouter;
//! point `with_base_url` at another compatible gateway to switch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LLMProvider, ProviderError};
use crate::config::OracleConfig;
use crate::constants::{LLM_PROMPT_BYTES_MAX, LLM_RESPONSE_BYTES_MAX};

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// =============================================================================
// OpenRouterProvider
// =============================================================================

/// Chat-completions provider for OpenRouter and compatible gateways.
///
/// # Example
///
/// ```rust,ignore
/// use triage_engine::config::OracleConfig;
/// use triage_engine::llm::OpenRouterProvider;
///
/// let provider = OpenRouterProvider::from_config(&OracleConfig::from_env()?);
/// ```
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenRouterProvider {
    /// Create a provider with default base URL and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(&OracleConfig::new(api_key))
    }

    /// Create a provider from resolved oracle settings.
    #[must_use]
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base (without the `/chat/completions` suffix).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Current model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn parse_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return ProviderError::AuthenticationFailed
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => return ProviderError::rate_limit(None),
            reqwest::StatusCode::REQUEST_TIMEOUT | reqwest::StatusCode::GATEWAY_TIMEOUT => {
                return ProviderError::Timeout
            }
            _ => {}
        }

        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        ProviderError::service_unavailable(format!("HTTP {status}: {detail}"))
    }
}

#[async_trait]
impl LLMProvider for OpenRouterProvider {
    #[tracing::instrument(skip(self, request), fields(model = %self.model, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        debug_assert!(
            request.prompt.len() <= LLM_PROMPT_BYTES_MAX,
            "prompt exceeds limit"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::network_error(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network_error(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(%status, "oracle request failed");
            return Err(Self::parse_error(status, &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("unparseable body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::invalid_response("no choices in response"))?
            .trim()
            .to_string();

        debug_assert!(text.len() <= LLM_RESPONSE_BYTES_MAX, "response exceeds limit");
        tracing::debug!(response = %text, "oracle responded");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn is_simulation(&self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
