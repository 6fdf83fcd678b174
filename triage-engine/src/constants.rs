//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `THRESHOLD_STEP_DELTA` (not `DELTA_THRESHOLD_STEP`)
//!
//! Every constant includes units in the name:
//! - _`COUNT_MAX` for quantity limits
//! - _`BYTES_MAX` for size limits
//! - _DEFAULT / _MIN / _MAX for tunable ranges

// =============================================================================
// Similarity Threshold
// =============================================================================

/// Initial similarity threshold for a fresh run
pub const THRESHOLD_DEFAULT: f64 = 0.75;

/// Lowest threshold the controller may reach
pub const THRESHOLD_MIN: f64 = 0.01;

/// Highest threshold the controller may reach
pub const THRESHOLD_MAX: f64 = 0.99;

/// Fixed step applied on INCREASE / DECREASE advice
pub const THRESHOLD_STEP_DELTA: f64 = 0.05;

// =============================================================================
// Similarity Scoring
// =============================================================================

/// Added to the norm product so zero vectors score 0 instead of NaN
pub const SIMILARITY_EPSILON: f64 = 1e-8;

// =============================================================================
// Categories
// =============================================================================

/// Label used when the oracle cannot name a ticket
pub const CATEGORY_UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Examples from each category shown to the merge oracle
pub const MERGE_EXAMPLES_COUNT_DEFAULT: usize = 2;

/// Most examples per category a merge prompt may carry. Two full previews
/// per example stay under half the prompt limit.
pub const MERGE_EXAMPLES_COUNT_MAX: usize = 10;

/// Maximum length of a category name
pub const CATEGORY_NAME_BYTES_MAX: usize = 256;

// =============================================================================
// Scheduler
// =============================================================================

/// Upper bound on post-ticket optimization passes in fixed-point mode
pub const OPTIMIZATION_PASSES_COUNT_MAX: usize = 32;

// =============================================================================
// Embedding Limits
// =============================================================================

/// Number of dimensions produced by the simulation embedder
/// (matches all-MiniLM-L6-v2)
pub const EMBEDDING_DIMENSIONS_COUNT: usize = 384;

/// Number of dimensions of OpenAI text-embedding-3-small
pub const EMBEDDING_OPENAI_DIMENSIONS_COUNT: usize = 1536;

// =============================================================================
// LLM Limits
// =============================================================================

/// Maximum prompt size in bytes
pub const LLM_PROMPT_BYTES_MAX: usize = 100_000;

/// Maximum response size in bytes
pub const LLM_RESPONSE_BYTES_MAX: usize = 100_000;

/// Ticket text preview length used in prompts
pub const LLM_TICKET_PREVIEW_BYTES_MAX: usize = 2_000;

// =============================================================================
// DST (Deterministic Simulation Testing) Limits
// =============================================================================

/// Maximum fault probability
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

// =============================================================================
// Tests
// =============================================================================
