//! Category Synthesis - name a new category and seed its centroid.

use crate::constants::CATEGORY_UNCATEGORIZED_LABEL;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::oracle::{CategoryOracle, OracleError};

/// Errors while synthesizing a category.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    /// Naming oracle failed
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Seed embedding failed
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Raw material for a new category.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Oracle reply, untouched
    pub raw_response: String,
    /// Seed centroid
    pub embedding: Vec<f32>,
}

impl Synthesis {
    /// Category name derived from the raw reply.
    #[must_use]
    pub fn category_name(&self) -> String {
        resolve_category_name(&self.raw_response)
    }
}

/// Ask the oracle for a name and embed the ticket.
///
/// # Errors
/// Propagates oracle and embedding failures.
pub async fn synthesize<E, O>(
    text: &str,
    embedder: &E,
    oracle: &O,
) -> Result<Synthesis, SynthesisError>
where
    E: EmbeddingProvider + ?Sized,
    O: CategoryOracle + ?Sized,
{
    let embedding = embedder.embed(text).await?;
    synthesize_from_embedding(text, embedding, oracle).await
}

/// Ask the oracle for a name, reusing an embedding the caller already has.
///
/// # Errors
/// Propagates oracle failures.
#[tracing::instrument(skip(text, embedding, oracle), fields(oracle = oracle.name()))]
pub async fn synthesize_from_embedding<O>(
    text: &str,
    embedding: Vec<f32>,
    oracle: &O,
) -> Result<Synthesis, SynthesisError>
where
    O: CategoryOracle + ?Sized,
{
    let raw_response = oracle.suggest_name(&[text]).await?;
    tracing::debug!(%raw_response, "oracle suggested name");
    Ok(Synthesis {
        raw_response,
        embedding,
    })
}

/// Turn a raw naming reply into a category name.
///
/// Takes the first non-blank line, trimmed. A reply that is empty or that
/// mentions "uncategorized" in any case becomes the literal
/// `Uncategorized` label.
///
/// ```rust
/// use triage_engine::engine::resolve_category_name;
///
/// assert_eq!(resolve_category_name("  Printer Issue \nbecause..."), "Printer Issue");
/// assert_eq!(resolve_category_name("UNCATEGORIZED."), "Uncategorized");
/// assert_eq!(resolve_category_name("\n\n"), "Uncategorized");
/// ```
#[must_use]
pub fn resolve_category_name(raw: &str) -> String {
    let first_line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    if first_line.is_empty() || first_line.to_lowercase().contains("uncategorized") {
        CATEGORY_UNCATEGORIZED_LABEL.to_string()
    } else {
        first_line.to_string()
    }
}
