//! Merge Advisor - find one pair of categories worth merging.

use crate::category::CategoryStore;
use crate::oracle::{CategoryOracle, OracleError};

/// A merge the oracle approved; `source` folds into `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeProposal {
    /// Surviving category (earlier in creation order)
    pub target: String,
    /// Category to absorb and delete
    pub source: String,
}

/// Pairwise merge scan.
#[derive(Debug, Clone)]
pub struct MergeAdvisor {
    examples_shown: usize,
}

impl MergeAdvisor {
    /// Advisor showing up to `examples_shown` examples per category.
    #[must_use]
    pub fn new(examples_shown: usize) -> Self {
        debug_assert!(examples_shown > 0);
        Self { examples_shown }
    }

    /// Ask the oracle about each unordered pair `(i < j)` in creation order
    /// and return the first one it approves.
    ///
    /// Approval is a reply containing `YES` in any case. At most one pair is
    /// proposed per call; the scan stops at the first approval.
    ///
    /// # Errors
    /// Oracle failures propagate and abort the scan.
    #[tracing::instrument(skip(self, store, oracle), fields(categories = store.len()))]
    pub async fn find_merge<O>(
        &self,
        store: &CategoryStore,
        oracle: &O,
    ) -> Result<Option<MergeProposal>, OracleError>
    where
        O: CategoryOracle + ?Sized,
    {
        let categories: Vec<_> = store.iter().collect();

        for (i, a) in categories.iter().enumerate() {
            for b in &categories[i + 1..] {
                let examples_a = shown(a.examples(), self.examples_shown);
                let examples_b = shown(b.examples(), self.examples_shown);

                let reply = oracle
                    .merge_decision(a.name(), examples_a, b.name(), examples_b)
                    .await?;

                if is_approval(&reply) {
                    tracing::debug!(keep = a.name(), absorb = b.name(), "merge approved");
                    return Ok(Some(MergeProposal {
                        target: a.name().to_string(),
                        source: b.name().to_string(),
                    }));
                }
            }
        }

        Ok(None)
    }
}

impl Default for MergeAdvisor {
    fn default() -> Self {
        Self::new(crate::constants::MERGE_EXAMPLES_COUNT_DEFAULT)
    }
}

fn shown(examples: &[String], limit: usize) -> &[String] {
    &examples[..examples.len().min(limit)]
}

fn is_approval(reply: &str) -> bool {
    reply.to_uppercase().contains("YES")
}
