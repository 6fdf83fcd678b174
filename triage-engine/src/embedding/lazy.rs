//! `LazyEmbeddingProvider` - owned, lazily-initialized model handle
//!
//! `TigerStyle`: Single initialization point, no process globals.
//!
//! Loading an embedding model is expensive, so it happens on the first
//! `embed` call rather than at construction. Concurrent first calls share
//! one initialization through `tokio::sync::OnceCell`; a failed
//! initialization is returned to the caller and retried on the next call.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{EmbeddingError, EmbeddingProvider};

type Factory<P> = Box<dyn Fn() -> Result<P, EmbeddingError> + Send + Sync>;

/// Embedding provider built on first use.
///
/// # Example
///
/// ```rust
/// use triage_engine::embedding::{EmbeddingProvider, LazyEmbeddingProvider, SimEmbeddingProvider};
///
/// #[tokio::main]
/// async fn main() {
///     let lazy = LazyEmbeddingProvider::new(384, || Ok(SimEmbeddingProvider::with_seed(7)));
///     assert!(!lazy.is_initialized());
///
///     lazy.embed("hello").await.unwrap();
///     assert!(lazy.is_initialized());
/// }
/// ```
pub struct LazyEmbeddingProvider<P> {
    dimensions: usize,
    cell: OnceCell<P>,
    factory: Factory<P>,
}

impl<P: EmbeddingProvider> LazyEmbeddingProvider<P> {
    /// Create a handle; `dimensions` must match what the factory's provider
    /// returns.
    #[must_use]
    pub fn new<F>(dimensions: usize, factory: F) -> Self
    where
        F: Fn() -> Result<P, EmbeddingError> + Send + Sync + 'static,
    {
        Self {
            dimensions,
            cell: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    /// True once the underlying provider has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn provider(&self) -> Result<&P, EmbeddingError> {
        self.cell
            .get_or_try_init(|| async {
                tracing::info!("loading embedding model");
                let provider = (self.factory)()?;
                if provider.dimensions() != self.dimensions {
                    return Err(EmbeddingError::dimension_mismatch(
                        self.dimensions,
                        provider.dimensions(),
                    ));
                }
                tracing::info!(provider = provider.name(), "embedding model loaded");
                Ok(provider)
            })
            .await
    }
}

impl<P> std::fmt::Debug for LazyEmbeddingProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyEmbeddingProvider")
            .field("dimensions", &self.dimensions)
            .field("initialized", &self.cell.initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for LazyEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.provider().await?.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        self.cell.get().map_or("lazy", |p| p.name())
    }

    fn is_simulation(&self) -> bool {
        self.cell.get().is_some_and(|p| p.is_simulation())
    }
}
