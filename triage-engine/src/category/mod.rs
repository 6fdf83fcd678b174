//! Category Store - the in-memory category model of one run.
//!
//! `TigerStyle`: Explicit errors, preconditions checked, centroid maintained
//! incrementally.
//!
//! # Overview
//!
//! A [`CategoryStore`] maps a unique category name to its example texts and a
//! centroid embedding. Iteration order is creation order, which is also the
//! tie-break order for [`CategoryStore::best_match`] and the scan order of the
//! merge advisor.
//!
//! The centroid is the example-count-weighted mean of every embedding folded
//! into the category. Raw ticket embeddings are not retained, so the mean
//! cannot be re-derived from `examples`; every mutation updates it in place.
//!
//! # Example
//!
//! ```rust
//! use triage_engine::category::CategoryStore;
//!
//! let mut store = CategoryStore::new();
//! store.create("Printer Issue", "printer jammed", vec![1.0, 0.0]).unwrap();
//! store.add_example("Printer Issue", "printer offline", &[0.0, 1.0]).unwrap();
//!
//! let category = store.get("Printer Issue").unwrap();
//! assert_eq!(category.example_count(), 2);
//! assert_eq!(category.centroid(), &[0.5, 0.5]);
//! ```

mod snapshot;

pub use snapshot::{CategoryRecord, CategorySnapshot, SnapshotError};

use crate::constants::CATEGORY_NAME_BYTES_MAX;
use crate::similarity;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from category store mutations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CategoryError {
    /// A category with this name already exists
    #[error("category already exists: {name}")]
    Duplicate {
        /// The colliding name
        name: String,
    },

    /// No category with this name
    #[error("category not found: {name}")]
    NotFound {
        /// The missing name
        name: String,
    },

    /// Merge target and source are the same category
    #[error("cannot merge category into itself: {name}")]
    SelfMerge {
        /// The category name
        name: String,
    },

    /// Name is empty or too long
    #[error("invalid category name: {reason}")]
    InvalidName {
        /// Why the name was rejected
        reason: String,
    },

    /// Embedding length differs from the store's dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of vectors already in the store
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },
}

impl CategoryError {
    /// Create a duplicate-name error.
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::Duplicate { name: name.into() }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A named cluster of tickets.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    examples: Vec<String>,
    centroid: Vec<f32>,
}

impl Category {
    fn new(name: String, example: String, embedding: Vec<f32>) -> Self {
        Self {
            name,
            examples: vec![example],
            centroid: embedding,
        }
    }

    /// Category name (unique within a store).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Example texts in assignment order.
    #[must_use]
    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Running mean of all embeddings folded into this category.
    #[must_use]
    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    /// Number of examples (the centroid's weight).
    #[must_use]
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    /// Fold one embedding into the centroid: `(c*n + e) / (n+1)`.
    fn absorb_embedding(&mut self, embedding: &[f32]) {
        let n = self.examples.len() as f64;
        for (c, e) in self.centroid.iter_mut().zip(embedding) {
            *c = ((f64::from(*c) * n + f64::from(*e)) / (n + 1.0)) as f32;
        }
    }
}

/// Result of a best-match scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMatch<'a> {
    /// Name of the most similar category
    pub name: &'a str,
    /// Cosine similarity between the query and that category's centroid
    pub similarity: f64,
}

// =============================================================================
// CategoryStore
// =============================================================================

/// Insertion-ordered mapping from category name to [`Category`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryStore {
    categories: Vec<Category>,
}

impl CategoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True when no categories exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Look up a category by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// True if a category with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Categories in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Category names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Embedding dimension of the store, if any category exists.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.categories.first().map(|c| c.centroid.len())
    }

    /// Sum of example counts over all categories.
    #[must_use]
    pub fn total_examples(&self) -> usize {
        self.categories.iter().map(Category::example_count).sum()
    }

    /// Mean examples per category; 0 for an empty store.
    #[must_use]
    pub fn average_examples(&self) -> f64 {
        if self.categories.is_empty() {
            return 0.0;
        }
        self.total_examples() as f64 / self.categories.len() as f64
    }

    /// Most similar category to `embedding`.
    ///
    /// Linear scan in creation order; the first category wins ties. A
    /// category only displaces the current best with a strictly greater
    /// score, starting from -1, so `None` means the store is empty (or
    /// nothing scored above -1).
    #[must_use]
    pub fn best_match(&self, embedding: &[f32]) -> Option<CategoryMatch<'_>> {
        let mut best: Option<CategoryMatch<'_>> = None;
        let mut best_similarity = -1.0_f64;

        for category in &self.categories {
            let similarity = similarity::score(embedding, &category.centroid);
            tracing::trace!(category = %category.name, similarity, "scored category");
            if similarity > best_similarity {
                best_similarity = similarity;
                best = Some(CategoryMatch {
                    name: &category.name,
                    similarity,
                });
            }
        }

        best
    }

    /// Insert a new category seeded with one example.
    ///
    /// # Errors
    /// `Duplicate` if the name exists, `InvalidName` for empty or oversized
    /// names, `DimensionMismatch` if the embedding length differs from the
    /// store's.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        example: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<(), CategoryError> {
        let name = name.into();
        validate_name(&name)?;
        self.validate_dimensions(&embedding)?;
        if self.contains(&name) {
            return Err(CategoryError::duplicate(name));
        }

        self.categories
            .push(Category::new(name, example.into(), embedding));
        Ok(())
    }

    /// Append an example and fold its embedding into the centroid.
    ///
    /// Returns the new example count.
    ///
    /// # Errors
    /// `NotFound` for an unknown name, `DimensionMismatch` for a wrong-sized
    /// embedding.
    pub fn add_example(
        &mut self,
        name: &str,
        example: impl Into<String>,
        embedding: &[f32],
    ) -> Result<usize, CategoryError> {
        self.validate_dimensions(embedding)?;
        let index = self
            .position(name)
            .ok_or_else(|| CategoryError::not_found(name))?;

        let category = &mut self.categories[index];
        category.absorb_embedding(embedding);
        category.examples.push(example.into());
        Ok(category.examples.len())
    }

    /// Fold `source` into `target`, then delete `source`.
    ///
    /// Examples are concatenated (target first) and the centroid becomes the
    /// mean of both centroids weighted by their pre-merge example counts.
    ///
    /// # Errors
    /// `NotFound` if either name is absent, `SelfMerge` if they are equal.
    pub fn merge(&mut self, target: &str, source: &str) -> Result<(), CategoryError> {
        let target_index = self
            .position(target)
            .ok_or_else(|| CategoryError::not_found(target))?;
        let source_index = self
            .position(source)
            .ok_or_else(|| CategoryError::not_found(source))?;
        if target_index == source_index {
            return Err(CategoryError::SelfMerge {
                name: target.to_string(),
            });
        }

        let absorbed = self.categories.remove(source_index);
        let target_index = if source_index < target_index {
            target_index - 1
        } else {
            target_index
        };
        let survivor = &mut self.categories[target_index];

        let n_target = survivor.examples.len() as f64;
        let n_source = absorbed.examples.len() as f64;
        let total = n_target + n_source;
        if total > 0.0 {
            for (c, s) in survivor.centroid.iter_mut().zip(&absorbed.centroid) {
                *c = ((f64::from(*c) * n_target + f64::from(*s) * n_source) / total) as f32;
            }
        }
        survivor.examples.extend(absorbed.examples);

        Ok(())
    }

    /// Rename a category in place; content and creation position unchanged.
    ///
    /// # Errors
    /// `NotFound` if `old` is absent, `Duplicate` if `new` already names a
    /// different category, `InvalidName` for an empty or oversized name.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<(), CategoryError> {
        let new = new.into();
        validate_name(&new)?;
        let index = self
            .position(old)
            .ok_or_else(|| CategoryError::not_found(old))?;
        if old == new {
            return Ok(());
        }
        if self.contains(&new) {
            return Err(CategoryError::duplicate(new));
        }

        self.categories[index].name = new;
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    fn validate_dimensions(&self, embedding: &[f32]) -> Result<(), CategoryError> {
        match self.dimensions() {
            Some(expected) if expected != embedding.len() => Err(CategoryError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Rebuild a category from persisted parts (snapshot restore).
    fn restore(&mut self, name: String, examples: Vec<String>, centroid: Vec<f32>) -> Result<(), CategoryError> {
        validate_name(&name)?;
        self.validate_dimensions(&centroid)?;
        if self.contains(&name) {
            return Err(CategoryError::duplicate(name));
        }
        self.categories.push(Category {
            name,
            examples,
            centroid,
        });
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), CategoryError> {
    if name.trim().is_empty() {
        return Err(CategoryError::InvalidName {
            reason: "name must not be empty".into(),
        });
    }
    if name.len() > CATEGORY_NAME_BYTES_MAX {
        return Err(CategoryError::InvalidName {
            reason: format!("name exceeds {CATEGORY_NAME_BYTES_MAX} bytes"),
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
