//! Simulated Embedding Provider for Deterministic Testing
//!
//! `TigerStyle`: Deterministic, reproducible embeddings for DST.
//!
//! # Algorithm
//!
//! Feature-hashed bag of words:
//! 1. Lowercase and split the text into alphanumeric tokens
//! 2. Seed a `DeterministicRng` with `hash(seed, token)` and draw one
//!    vector in [-1, 1] per token
//! 3. Sum the token vectors and normalize to unit length
//!
//! Texts sharing words therefore score closer than unrelated texts, which is
//! enough structure for the categorizer to form sensible clusters offline.
//! A text with no tokens falls back to a vector derived from the raw text.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;

use super::{normalize_vector, EmbeddingError, EmbeddingProvider};
use crate::constants::EMBEDDING_DIMENSIONS_COUNT;
use crate::dst::{DeterministicRng, FaultInjector, FaultType};

// =============================================================================
// SimEmbeddingProvider
// =============================================================================

/// In-memory embedding provider for deterministic simulation testing.
///
/// # Example
///
/// ```rust
/// use triage_engine::embedding::{EmbeddingProvider, SimEmbeddingProvider};
///
/// #[tokio::main]
/// async fn main() {
///     let provider = SimEmbeddingProvider::with_seed(42);
///
///     let a = provider.embed("VPN keeps dropping").await.unwrap();
///     let b = provider.embed("VPN keeps dropping").await.unwrap();
///     assert_eq!(a, b);
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SimEmbeddingProvider {
    seed: u64,
    dimensions: usize,
    fault_injector: Option<Arc<FaultInjector>>,
}

impl SimEmbeddingProvider {
    /// Create a provider with the given seed and default dimensions.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            dimensions: EMBEDDING_DIMENSIONS_COUNT,
            fault_injector: None,
        }
    }

    /// Create with fault injection enabled.
    #[must_use]
    pub fn with_faults(seed: u64, fault_injector: Arc<FaultInjector>) -> Self {
        Self {
            fault_injector: Some(fault_injector),
            ..Self::with_seed(seed)
        }
    }

    /// Override the vector length.
    ///
    /// # Panics
    /// Panics if `dimensions` is zero.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        assert!(dimensions > 0, "dimensions must be positive");
        self.dimensions = dimensions;
        self
    }

    fn hash_token(&self, token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn token_vector(&self, token: &str) -> Vec<f32> {
        let mut rng = DeterministicRng::new(self.hash_token(token));
        (0..self.dimensions)
            .map(|_| (rng.next_float() * 2.0 - 1.0) as f32)
            .collect()
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.is_empty() {
            return normalize_vector(&self.token_vector(text));
        }

        let mut sum = vec![0.0_f32; self.dimensions];
        for token in tokens {
            for (s, v) in sum.iter_mut().zip(self.token_vector(token)) {
                *s += v;
            }
        }
        normalize_vector(&sum)
    }
}

#[async_trait]
impl EmbeddingProvider for SimEmbeddingProvider {
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(fault) = self
            .fault_injector
            .as_ref()
            .and_then(|f| f.should_inject("embedding_embed"))
        {
            tracing::debug!(fault = fault.as_str(), "injecting embedding fault");
            return Err(match fault {
                FaultType::EmbeddingTimeout => EmbeddingError::timeout(),
                _ => EmbeddingError::service_unavailable("simulated outage"),
            });
        }

        let embedding = self.generate_embedding(text);
        debug_assert_eq!(embedding.len(), self.dimensions);
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "sim"
    }

    fn is_simulation(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dst::{FaultConfig, FaultInjectorBuilder};
    use crate::similarity;

    #[tokio::test]
    async fn test_unit_length() {
        let provider = SimEmbeddingProvider::with_seed(42);
        let embedding = provider.embed("reset my password").await.unwrap();
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_case_and_punctuation_insensitive() {
        let provider = SimEmbeddingProvider::with_seed(42);
        let a = provider.embed("Printer not working!").await.unwrap();
        let b = provider.embed("printer   not working").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = SimEmbeddingProvider::with_seed(42);
        let base = provider.embed("vpn connection drops").await.unwrap();
        let related = provider.embed("vpn connection slow").await.unwrap();
        let unrelated = provider.embed("invoice total wrong").await.unwrap();

        assert!(similarity::score(&base, &related) > similarity::score(&base, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_embeds() {
        let provider = SimEmbeddingProvider::with_seed(1).with_dimensions(8);
        let embedding = provider.embed("").await.unwrap();
        assert_eq!(embedding.len(), 8);
    }

    #[tokio::test]
    async fn test_different_seeds_differ() {
        let a = SimEmbeddingProvider::with_seed(1).embed("hello").await.unwrap();
        let b = SimEmbeddingProvider::with_seed(2).embed("hello").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let faults = Arc::new(
            FaultInjectorBuilder::new(DeterministicRng::new(9))
                .with_fault(FaultConfig::new(FaultType::EmbeddingTimeout, 1.0).with_filter("embedding"))
                .build(),
        );
        let provider = SimEmbeddingProvider::with_faults(9, faults);
        assert!(matches!(
            provider.embed("anything").await,
            Err(EmbeddingError::Timeout)
        ));
    }
}
