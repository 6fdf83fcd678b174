//! Provider Configuration
//!
//! `TigerStyle`: Explicit over implicit, environment read in one place.
//!
//! Resolves oracle and embedding endpoint settings from environment
//! variables. The binary loads `.env` with `dotenvy` before calling
//! `from_env`; library users can pass their own lookup to `from_lookup`.

use crate::constants::{EMBEDDING_OPENAI_DIMENSIONS_COUNT, THRESHOLD_MAX, THRESHOLD_MIN};

/// Oracle API key variable.
pub const ORACLE_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Oracle API base variable.
pub const ORACLE_BASE_URL_ENV: &str = "OPENROUTER_API_BASE";
/// Oracle model variable.
pub const ORACLE_MODEL_ENV: &str = "OPENROUTER_MODEL";
/// Default oracle API base.
pub const ORACLE_BASE_URL_DEFAULT: &str = "https://openrouter.ai/api/v1";
/// Default oracle model.
pub const ORACLE_MODEL_DEFAULT: &str = "openai/gpt-oss-20b:free";

/// Embedding API key variable.
pub const EMBEDDING_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Embedding API base variable.
pub const EMBEDDING_BASE_URL_ENV: &str = "EMBEDDING_API_BASE";
/// Embedding model variable.
pub const EMBEDDING_MODEL_ENV: &str = "EMBEDDING_MODEL";
/// Default embedding API base.
pub const EMBEDDING_BASE_URL_DEFAULT: &str = "https://api.openai.com/v1";
/// Default embedding model.
pub const EMBEDDING_MODEL_DEFAULT: &str = "text-embedding-3-small";

// =============================================================================
// Error Types
// =============================================================================

/// Configuration errors, all fatal before any ticket is processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Required credential not set
    #[error("{variable} not set")]
    MissingApiKey {
        /// Environment variable name
        variable: &'static str,
    },

    /// Threshold outside the controller's range
    #[error("threshold {value} outside [{min}, {max}]", min = THRESHOLD_MIN, max = THRESHOLD_MAX)]
    InvalidThreshold {
        /// Rejected value
        value: f64,
    },

    /// Any other out-of-range setting
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-setting error.
    #[must_use]
    pub fn invalid_setting(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            name,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// OracleConfig
// =============================================================================

/// Settings for the chat-completions oracle endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// Bearer token
    pub api_key: String,
    /// API base, `/chat/completions` is appended
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

impl OracleConfig {
    /// Config with the given key and default base URL and model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ORACLE_BASE_URL_DEFAULT.to_string(),
            model: ORACLE_MODEL_DEFAULT.to_string(),
        }
    }

    /// Read from the process environment.
    ///
    /// # Errors
    /// `MissingApiKey` if `OPENROUTER_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup.
    ///
    /// # Errors
    /// `MissingApiKey` if the API key is absent or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = non_empty(lookup(ORACLE_API_KEY_ENV)).ok_or(ConfigError::MissingApiKey {
            variable: ORACLE_API_KEY_ENV,
        })?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty(lookup(ORACLE_BASE_URL_ENV)) {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty(lookup(ORACLE_MODEL_ENV)) {
            config.model = model;
        }
        Ok(config)
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// =============================================================================
// EmbeddingConfig
// =============================================================================

/// Settings for the embeddings endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Bearer token
    pub api_key: String,
    /// API base, `/embeddings` is appended
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Requested vector length
    pub dimensions: usize,
}

impl EmbeddingConfig {
    /// Config with the given key and default base URL, model and dimensions.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: EMBEDDING_BASE_URL_DEFAULT.to_string(),
            model: EMBEDDING_MODEL_DEFAULT.to_string(),
            dimensions: EMBEDDING_OPENAI_DIMENSIONS_COUNT,
        }
    }

    /// Read from the process environment.
    ///
    /// # Errors
    /// `MissingApiKey` if `OPENAI_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup.
    ///
    /// # Errors
    /// `MissingApiKey` if the API key is absent or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = non_empty(lookup(EMBEDDING_API_KEY_ENV)).ok_or(ConfigError::MissingApiKey {
            variable: EMBEDDING_API_KEY_ENV,
        })?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty(lookup(EMBEDDING_BASE_URL_ENV)) {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty(lookup(EMBEDDING_MODEL_ENV)) {
            config.model = model;
        }
        Ok(config)
    }

    /// Override the vector length.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
