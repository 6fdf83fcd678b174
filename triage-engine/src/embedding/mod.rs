//! Embedding Provider Trait - Unified Interface for Text Embeddings
//!
//! `TigerStyle`: Simulation-first embedding generation.
//!
//! # Architecture
//!
//! ```text
//! EmbeddingProvider (trait)
//! ├── SimEmbeddingProvider     (always available, deterministic)
//! ├── LazyEmbeddingProvider    (owned handle, initialized on first embed)
//! └── OpenAIEmbeddingProvider  (feature: embedding-openai)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use triage_engine::embedding::{EmbeddingProvider, SimEmbeddingProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = SimEmbeddingProvider::with_seed(42);
//!
//!     let embedding = provider.embed("printer not working").await.unwrap();
//!     assert_eq!(embedding.len(), provider.dimensions());
//! }
//! ```

mod lazy;
mod sim;

#[cfg(feature = "embedding-openai")]
mod openai;

pub use lazy::LazyEmbeddingProvider;
pub use sim::SimEmbeddingProvider;

#[cfg(feature = "embedding-openai")]
pub use openai::OpenAIEmbeddingProvider;

use async_trait::async_trait;

// =============================================================================
// Error Types
// =============================================================================

/// Unified error type for all embedding providers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
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

    /// Service unavailable
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

    /// Model could not be loaded
    #[error("Embedding model initialization failed: {message}")]
    Initialization {
        /// Why loading failed
        message: String,
    },

    /// Dimension mismatch in returned embedding
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: usize,
        /// Actual dimensions received
        actual: usize,
    },
}

impl EmbeddingError {
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

    /// Create an initialization error.
    #[must_use]
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

// =============================================================================
// Provider Trait
// =============================================================================

/// Trait for embedding providers.
///
/// Implementations must be deterministic for a given text within one run:
/// the centroid of a category is only meaningful if re-embedding the same
/// ticket yields the same vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    /// Returns `EmbeddingError` on failure (rate limit, network error, etc.)
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Provider name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Check if this is a simulation provider.
    fn is_simulation(&self) -> bool;
}

#[async_trait]
impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text).await
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_simulation(&self) -> bool {
        (**self).is_simulation()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate that an embedding has the expected dimensions.
///
/// # Errors
/// Returns `EmbeddingError::DimensionMismatch` if dimensions don't match
pub fn validate_dimensions(embedding: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if embedding.len() != expected {
        return Err(EmbeddingError::dimension_mismatch(expected, embedding.len()));
    }
    Ok(())
}

/// Normalize a vector to unit length (L2 norm = 1).
///
/// # Panics
/// Panics if the input vector is all zeros.
#[must_use]
pub fn normalize_vector(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();

    assert!(norm > 0.0, "Cannot normalize zero vector");

    vec.iter().map(|x| x / norm).collect()
}

// =============================================================================
// Tests
// =============================================================================
