//! Top-level error for a categorization run.

use crate::category::{CategoryError, SnapshotError};
use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::embedding::EmbeddingError;
use crate::engine::SynthesisError;
use crate::oracle::OracleError;
use crate::tickets::TicketError;

/// Anything that aborts a run.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Oracle call failed
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Embedding call failed
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Store rejected a creation or assignment
    #[error("category store error: {0}")]
    Category(#[from] CategoryError),

    /// Ticket input could not be loaded
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// Progress could not be persisted
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Category memory could not be read
    #[error("category memory error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl From<SynthesisError> for TriageError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Oracle(e) => Self::Oracle(e),
            SynthesisError::Embedding(e) => Self::Embedding(e),
        }
    }
}
