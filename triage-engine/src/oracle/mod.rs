//! Category Oracle - the judgment calls a run delegates
//!
//! `TigerStyle`: Injected strategy, no network access from the scheduler.
//!
//! # Architecture
//!
//! ```text
//! CategoryOracle (trait)
//! ├── LlmOracle<L: LLMProvider>   (prompts a chat model)
//! └── ScriptedOracle              (queued answers, records calls)
//! ```
//!
//! Every method returns the raw reply text. Interpreting it (first line of a
//! name, YES detection, INCREASE/DECREASE parsing) is the engine's job, so
//! all oracles share one tolerant parser.

mod llm;
pub mod prompts;
mod scripted;

pub use llm::LlmOracle;
pub use scripted::{OracleCall, ScriptedOracle};

use async_trait::async_trait;

use crate::constants::LLM_PROMPT_BYTES_MAX;
use crate::llm::ProviderError;

// =============================================================================
// Error Types
// =============================================================================

/// Oracle failures. All are fatal to a run; nothing retries.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OracleError {
    /// The backing LLM provider failed
    #[error("oracle provider '{provider}' failed: {source}")]
    Provider {
        /// Provider name
        provider: &'static str,
        /// Underlying error
        #[source]
        source: ProviderError,
    },

    /// A rendered prompt is over the provider's size limit
    #[error("oracle prompt is {bytes} bytes, limit is {max}")]
    PromptTooLarge {
        /// Rendered prompt size
        bytes: usize,
        /// Allowed size
        max: usize,
    },
}

impl OracleError {
    /// Wrap a provider error.
    #[must_use]
    pub fn provider(provider: &'static str, source: ProviderError) -> Self {
        Self::Provider { provider, source }
    }

    /// Create a prompt-too-large error.
    #[must_use]
    pub fn prompt_too_large(bytes: usize) -> Self {
        Self::PromptTooLarge {
            bytes,
            max: LLM_PROMPT_BYTES_MAX,
        }
    }
}

// =============================================================================
// Oracle Trait
// =============================================================================

/// The three questions a categorization run asks.
#[async_trait]
pub trait CategoryOracle: Send + Sync {
    /// Suggest a short category name for the given ticket texts, or reply
    /// `Uncategorized`.
    ///
    /// # Errors
    /// Returns `OracleError` if the oracle cannot be reached.
    async fn suggest_name(&self, tickets: &[&str]) -> Result<String, OracleError>;

    /// Ask whether two categories describe the same problem. A reply
    /// containing `YES` means merge.
    ///
    /// # Errors
    /// Returns `OracleError` if the oracle cannot be reached.
    async fn merge_decision(
        &self,
        name_a: &str,
        examples_a: &[String],
        name_b: &str,
        examples_b: &[String],
    ) -> Result<String, OracleError>;

    /// Ask how the similarity threshold should move.
    ///
    /// # Errors
    /// Returns `OracleError` if the oracle cannot be reached.
    async fn adjust_threshold(
        &self,
        threshold: f64,
        num_categories: usize,
        avg_examples: f64,
    ) -> Result<String, OracleError>;

    /// Oracle name for logging.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: CategoryOracle + ?Sized> CategoryOracle for Box<T> {
    async fn suggest_name(&self, tickets: &[&str]) -> Result<String, OracleError> {
        (**self).suggest_name(tickets).await
    }

    async fn merge_decision(
        &self,
        name_a: &str,
        examples_a: &[String],
        name_b: &str,
        examples_b: &[String],
    ) -> Result<String, OracleError> {
        (**self)
            .merge_decision(name_a, examples_a, name_b, examples_b)
            .await
    }

    async fn adjust_threshold(
        &self,
        threshold: f64,
        num_categories: usize,
        avg_examples: f64,
    ) -> Result<String, OracleError> {
        (**self)
            .adjust_threshold(threshold, num_categories, avg_examples)
            .await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
