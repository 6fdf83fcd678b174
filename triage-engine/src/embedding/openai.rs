//! `OpenAIEmbeddingProvider` - OpenAI-compatible embeddings over HTTP
//!
//! `TigerStyle`: Production embedding provider, feature-gated behind
//! `embedding-openai`.
//!
//! Uses `text-embedding-3-small` by default. One request per text; the run
//! awaits each embedding before the next decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{validate_dimensions, EmbeddingError, EmbeddingProvider};
use crate::config::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// OpenAI embeddings API provider.
///
/// ```rust,ignore
/// use triage_engine::config::EmbeddingConfig;
/// use triage_engine::embedding::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::from_config(&EmbeddingConfig::from_env()?);
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from resolved embedding settings.
    #[must_use]
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            dimensions: config.dimensions,
        }
    }

    /// Current model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }

    fn parse_error(status: reqwest::StatusCode, body: &str) -> EmbeddingError {
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                EmbeddingError::AuthenticationFailed
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => EmbeddingError::rate_limit(None),
            reqwest::StatusCode::REQUEST_TIMEOUT | reqwest::StatusCode::GATEWAY_TIMEOUT => {
                EmbeddingError::Timeout
            }
            _ => EmbeddingError::service_unavailable(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    #[tracing::instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.model,
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::network_error(e.to_string())
                }
            })?;

        let status = response.status();
        let text_body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::network_error(e.to_string()))?;
        if !status.is_success() {
            return Err(Self::parse_error(status, &text_body));
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&text_body)
            .map_err(|e| EmbeddingError::invalid_response(e.to_string()))?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::invalid_response("no embeddings returned"))?;

        validate_dimensions(&embedding, self.dimensions)?;
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_simulation(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAIEmbeddingProvider {
        OpenAIEmbeddingProvider::from_config(&EmbeddingConfig::new("key"))
    }

    #[test]
    fn test_defaults_from_config() {
        let p = provider();
        assert_eq!(p.model(), "text-embedding-3-small");
        assert_eq!(p.endpoint(), "https://api.openai.com/v1/embeddings");
        assert_eq!(p.dimensions(), crate::constants::EMBEDDING_OPENAI_DIMENSIONS_COUNT);
    }

    #[test]
    fn test_request_body_shape() {
        let body = EmbeddingRequest {
            input: "vpn down",
            model: "m",
            dimensions: 8,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"input": "vpn down", "model": "m", "dimensions": 8}));
    }

    #[test]
    fn test_parse_error_mapping() {
        assert!(matches!(
            OpenAIEmbeddingProvider::parse_error(reqwest::StatusCode::UNAUTHORIZED, ""),
            EmbeddingError::AuthenticationFailed
        ));
        assert!(matches!(
            OpenAIEmbeddingProvider::parse_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            EmbeddingError::ServiceUnavailable { .. }
        ));
    }
}
