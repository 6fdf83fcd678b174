//! Assignment Policy - route a ticket to an existing category.
//!
//! A ticket is placed only when its best match scores at or above the
//! threshold. Falling short is a normal outcome, not an error.

use crate::category::CategoryStore;
use crate::embedding::{validate_dimensions, EmbeddingError, EmbeddingProvider};

/// Outcome of one assignment attempt.
///
/// Both variants carry the embedding computed for scoring so the caller can
/// update a centroid or seed a new category without embedding the text
/// again.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// Confident match.
    Matched {
        /// Category to join
        category: String,
        /// Score of that category, >= threshold
        similarity: f64,
        /// Ticket embedding
        embedding: Vec<f32>,
    },
    /// No category cleared the threshold.
    Unmatched {
        /// Ticket embedding
        embedding: Vec<f32>,
        /// Best candidate below the threshold, if the store is non-empty
        best: Option<(String, f64)>,
    },
}

impl Assignment {
    /// Ticket embedding, whichever the outcome.
    #[must_use]
    pub fn embedding(&self) -> &[f32] {
        match self {
            Self::Matched { embedding, .. } | Self::Unmatched { embedding, .. } => embedding,
        }
    }
}

/// Embed `text` and test it against every category.
///
/// # Errors
/// Propagates embedding failures, and returns `DimensionMismatch` if the
/// provider hands back a vector of the wrong length.
#[tracing::instrument(skip(text, store, embedder), fields(categories = store.len()))]
pub async fn assign<E>(
    text: &str,
    store: &CategoryStore,
    threshold: f64,
    embedder: &E,
) -> Result<Assignment, EmbeddingError>
where
    E: EmbeddingProvider + ?Sized,
{
    let embedding = embedder.embed(text).await?;
    validate_dimensions(&embedding, embedder.dimensions())?;

    let outcome = match store.best_match(&embedding) {
        Some(found) if found.similarity >= threshold => {
            tracing::debug!(category = found.name, similarity = found.similarity, "matched");
            Assignment::Matched {
                category: found.name.to_string(),
                similarity: found.similarity,
                embedding,
            }
        }
        found => {
            let best = found.map(|m| (m.name.to_string(), m.similarity));
            tracing::debug!(?best, "no confident match");
            Assignment::Unmatched { embedding, best }
        }
    };

    Ok(outcome)
}
