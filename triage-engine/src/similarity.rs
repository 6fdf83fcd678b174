//! Similarity Scorer
//!
//! Cosine similarity between two embeddings. Pure and total: a zero vector
//! scores 0 rather than NaN because of the epsilon in the denominator.

use crate::constants::SIMILARITY_EPSILON;

/// Cosine similarity of `u` and `v`, stabilized with `SIMILARITY_EPSILON`.
///
/// Accumulates in `f64`. The result is nominally in [-1, 1] and is not
/// clamped. Vectors of different length are compared over their shared
/// prefix; callers validate dimensions before vectors reach the store.
///
/// # Example
///
/// ```rust
/// use triage_engine::similarity::score;
///
/// let s = score(&[1.0, 0.0], &[1.0, 0.0]);
/// assert!((s - 1.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn score(u: &[f32], v: &[f32]) -> f64 {
    debug_assert_eq!(u.len(), v.len(), "vectors should have same length");

    let (mut dot, mut norm_u, mut norm_v) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (a, b) in u.iter().zip(v) {
        let (a, b) = (f64::from(*a), f64::from(*b));
        dot += a * b;
        norm_u += a * a;
        norm_v += b * b;
    }

    dot / (norm_u.sqrt() * norm_v.sqrt() + SIMILARITY_EPSILON)
}
