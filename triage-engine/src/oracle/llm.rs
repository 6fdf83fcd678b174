//! `LlmOracle` - oracle backed by any `LLMProvider`.

use async_trait::async_trait;

use super::{prompts, CategoryOracle, OracleError};
use crate::constants::LLM_PROMPT_BYTES_MAX;
use crate::llm::{CompletionRequest, LLMProvider};

/// Oracle that renders each question as a prompt and returns the model's
/// reply verbatim.
///
/// # Example
///
/// ```rust
/// use triage_engine::llm::SimLLMProvider;
/// use triage_engine::oracle::{CategoryOracle, LlmOracle};
///
/// #[tokio::main]
/// async fn main() {
///     let oracle = LlmOracle::new(SimLLMProvider::with_seed(42));
///     let name = oracle.suggest_name(&["printer not working"]).await.unwrap();
///     assert_eq!(name, "Printer Issue");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LlmOracle<L> {
    llm: L,
}

impl<L: LLMProvider> LlmOracle<L> {
    /// Wrap a provider.
    #[must_use]
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    /// The wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &L {
        &self.llm
    }

    async fn ask(&self, prompt: String) -> Result<String, OracleError> {
        if prompt.len() > LLM_PROMPT_BYTES_MAX {
            return Err(OracleError::prompt_too_large(prompt.len()));
        }
        let request = CompletionRequest::new(prompt);
        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| OracleError::provider(self.llm.name(), e))?;
        tracing::debug!(provider = self.llm.name(), %response, "oracle replied");
        Ok(response)
    }
}

#[async_trait]
impl<L: LLMProvider> CategoryOracle for LlmOracle<L> {
    #[tracing::instrument(skip(self, tickets), fields(ticket_count = tickets.len()))]
    async fn suggest_name(&self, tickets: &[&str]) -> Result<String, OracleError> {
        self.ask(prompts::suggest_name_prompt(tickets)).await
    }

    #[tracing::instrument(skip(self, examples_a, examples_b))]
    async fn merge_decision(
        &self,
        name_a: &str,
        examples_a: &[String],
        name_b: &str,
        examples_b: &[String],
    ) -> Result<String, OracleError> {
        self.ask(prompts::merge_decision_prompt(
            name_a, examples_a, name_b, examples_b,
        ))
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_threshold(
        &self,
        threshold: f64,
        num_categories: usize,
        avg_examples: f64,
    ) -> Result<String, OracleError> {
        self.ask(prompts::adjust_threshold_prompt(
            threshold,
            num_categories,
            avg_examples,
        ))
        .await
    }

    fn name(&self) -> &'static str {
        self.llm.name()
    }
}
