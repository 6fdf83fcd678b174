//! LLM Provider Trait - Unified Interface for Sim and Production
//!
//! `TigerStyle`: Simulation-first LLM abstraction.
//!
//! # Architecture
//!
//! ```text
//! LLMProvider (trait)
//! ├── SimLLMProvider       (always available, deterministic)
//! └── OpenRouterProvider   (feature: openai)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use triage_engine::llm::{CompletionRequest, LLMProvider, SimLLMProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = SimLLMProvider::with_seed(42);
//!
//!     let request = CompletionRequest::new("Should these two categories be merged?");
//!     let response = provider.complete(&request).await.unwrap();
//!     println!("Response: {response}");
//! }
//! ```

mod sim;

#[cfg(feature = "openai")]
mod openai;

pub use sim::SimLLMProvider;

#[cfg(feature = "openai")]
pub use openai::OpenRouterProvider;

use async_trait::async_trait;

use crate::constants::LLM_PROMPT_BYTES_MAX;

// =============================================================================
// Error Types
// =============================================================================

/// Unified error type for all LLM providers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?}s")]
    RateLimit {
        /// Seconds until rate limit resets (if known)
        retry_after_secs: Option<u64>,
    },

    /// Invalid response from provider
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// Non-success status from the service
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Reason for unavailability
        message: String,
    },

    /// Authentication failed
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// Description of the network error
        message: String,
    },
}

impl ProviderError {
    /// Create a timeout error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limit(retry_after_secs: Option<u64>) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a service unavailable error.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Request for LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// The prompt text (required)
    pub prompt: String,
    /// Optional system message (for chat-style APIs)
    pub system: Option<String>,
    /// Maximum tokens to generate (provider default if None)
    pub max_tokens: Option<usize>,
    /// Temperature (0.0-1.0, provider default if None)
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a new completion request with just a prompt.
    ///
    /// # Panics
    /// Panics if prompt is empty or exceeds `LLM_PROMPT_BYTES_MAX`.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();

        assert!(!prompt.is_empty(), "prompt must not be empty");
        assert!(
            prompt.len() <= LLM_PROMPT_BYTES_MAX,
            "prompt exceeds {LLM_PROMPT_BYTES_MAX} bytes"
        );

        Self {
            prompt,
            system: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the system message.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set maximum tokens to generate.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature.
    ///
    /// # Panics
    /// Panics if temperature is not in [0.0, 1.0].
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&temperature),
            "temperature must be in [0.0, 1.0]"
        );
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for LLM providers.
///
/// Object-safe so the binary can pick a provider at runtime and hand a
/// `Box<dyn LLMProvider>` to the oracle.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete a prompt with a text response.
    ///
    /// # Errors
    /// Returns `ProviderError` on failure.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Get the provider name for logging/debugging.
    fn name(&self) -> &'static str;

    /// Check if this is a simulation provider.
    fn is_simulation(&self) -> bool;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Box<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_simulation(&self) -> bool {
        (**self).is_simulation()
    }
}

// =============================================================================
// Tests
// =============================================================================
