//! # Triage Engine
//!
//! Online categorization of support tickets without predefined labels.
//!
//! Tickets are embedded and routed to the most similar category centroid; a
//! language model acts as an oracle for naming new categories, deciding
//! merges, and recalibrating the similarity threshold.
//!
//! ## Quick Start
//!
//! ```rust
//! use triage_engine::checkpoint::NoCheckpoint;
//! use triage_engine::engine::Categorizer;
//! use triage_engine::tickets::TicketTable;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = TicketTable::from_json_str(
//!     r#"[{"Description": "printer not working"}, {"Description": "printer not working"}]"#,
//! )?;
//!
//! // Deterministic simulation providers, seed 42
//! let mut engine = Categorizer::sim(42);
//! let report = engine.run(table.tickets(), &mut NoCheckpoint).await?;
//!
//! assert_eq!(report.labels[0].as_deref(), Some("Printer Issue"));
//! assert_eq!(engine.store().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Categorizer (engine)                     │
//! ├─────────────────────────────────────────────────────────┤
//! │  Assignment │ Synthesis │ MergeAdvisor │ RenameAdvisor   │
//! │  ThresholdController    │ Decision Scheduler             │
//! ├─────────────────────────────────────────────────────────┤
//! │  CategoryStore (centroids)  │  Checkpoint (JSON files)   │
//! ├─────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider          │  CategoryOracle            │
//! │  (sim / OpenAI / lazy)      │  (LLM-backed / scripted)   │
//! ├─────────────────────────────────────────────────────────┤
//! │  DST Framework              │  Fault injection + seeds   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Feature Flags
//!
//! - `openai` - OpenAI-compatible chat provider (OpenRouter by default)
//! - `embedding-openai` - OpenAI embeddings provider

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod category;
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod dst;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod similarity;
pub mod telemetry;
pub mod tickets;

// Re-export common types
pub use category::{Category, CategoryError, CategorySnapshot, CategoryStore};
pub use checkpoint::{Checkpoint, CheckpointError, FileCheckpoint, MemoryCheckpoint, NoCheckpoint};
pub use config::{ConfigError, EmbeddingConfig, OracleConfig};
pub use dst::{DeterministicRng, FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
pub use engine::{
    Categorizer, CreationMode, RunReport, RunState, TerminationMode, TriageConfig,
};
pub use error::TriageError;
pub use tickets::{TableFormat, Ticket, TicketError, TicketTable};

// LLM Provider exports
pub use llm::{CompletionRequest, LLMProvider, ProviderError, SimLLMProvider};

#[cfg(feature = "openai")]
pub use llm::OpenRouterProvider;

// Embedding Provider exports
pub use embedding::{
    EmbeddingError, EmbeddingProvider, LazyEmbeddingProvider, SimEmbeddingProvider,
};

#[cfg(feature = "embedding-openai")]
pub use embedding::OpenAIEmbeddingProvider;

// Oracle exports
pub use oracle::{CategoryOracle, LlmOracle, OracleError, ScriptedOracle};
