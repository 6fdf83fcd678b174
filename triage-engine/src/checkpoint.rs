//! Checkpointing - per-iteration persistence of a run
//!
//! `TigerStyle`: Whole-file rewrites, no partial state on disk.
//!
//! A run hands the store and its labels to a [`Checkpoint`] after every
//! iteration. The memory file is reset at the start of a run so nothing
//! carries over between runs.

use std::path::{Path, PathBuf};

use crate::category::{CategorySnapshot, CategoryStore, SnapshotError};
use crate::engine::RunState;
use crate::tickets::{TableFormat, TicketError, TicketTable};

/// Contents written to the memory file at run start.
pub const MEMORY_FILE_EMPTY: &str = "{}";

// =============================================================================
// Error Types
// =============================================================================

/// Errors persisting a checkpoint. All are fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// A file could not be written
    #[error("failed to write {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The store could not be serialized
    #[error("failed to serialize category memory: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The labeled table could not be serialized
    #[error("failed to serialize labeled tickets: {0}")]
    Json(#[from] serde_json::Error),

    /// The labeled table could not be written as CSV
    #[error("failed to write labeled tickets: {0}")]
    Table(#[from] TicketError),
}

// =============================================================================
// Checkpoint Trait
// =============================================================================

/// Sink for run progress.
pub trait Checkpoint: Send {
    /// Called once before the first iteration.
    ///
    /// # Errors
    /// Returns `CheckpointError` if the sink cannot be reset.
    fn begin(&mut self, store: &CategoryStore) -> Result<(), CheckpointError>;

    /// Called after every iteration.
    ///
    /// # Errors
    /// Returns `CheckpointError` if the state cannot be persisted.
    fn save(&mut self, store: &CategoryStore, run: &RunState) -> Result<(), CheckpointError>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoint;

impl Checkpoint for NoCheckpoint {
    fn begin(&mut self, _store: &CategoryStore) -> Result<(), CheckpointError> {
        Ok(())
    }

    fn save(&mut self, _store: &CategoryStore, _run: &RunState) -> Result<(), CheckpointError> {
        Ok(())
    }
}

/// Keeps every saved state in memory. Used by tests and embedders that
/// inspect a run after the fact.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpoint {
    began: bool,
    saves: Vec<(CategorySnapshot, Vec<Option<String>>)>,
}

impl MemoryCheckpoint {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `begin` ran.
    #[must_use]
    pub fn began(&self) -> bool {
        self.began
    }

    /// Saved `(memory, labels)` pairs, one per iteration.
    #[must_use]
    pub fn saves(&self) -> &[(CategorySnapshot, Vec<Option<String>>)] {
        &self.saves
    }

    /// Most recent save.
    #[must_use]
    pub fn last(&self) -> Option<&(CategorySnapshot, Vec<Option<String>>)> {
        self.saves.last()
    }
}

impl Checkpoint for MemoryCheckpoint {
    fn begin(&mut self, _store: &CategoryStore) -> Result<(), CheckpointError> {
        self.began = true;
        self.saves.clear();
        Ok(())
    }

    fn save(&mut self, store: &CategoryStore, run: &RunState) -> Result<(), CheckpointError> {
        self.saves.push((store.snapshot(), run.labels().to_vec()));
        Ok(())
    }
}

/// Writes the category memory file and, optionally, the labeled ticket
/// table.
///
/// # Example
///
/// ```rust,no_run
/// use triage_engine::checkpoint::FileCheckpoint;
/// use triage_engine::tickets::TicketTable;
///
/// let table = TicketTable::from_path("tickets.json").unwrap();
/// let checkpoint = FileCheckpoint::new("category_memory.json")
///     .with_output("tickets_categorized.json", table);
/// ```
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    memory_path: PathBuf,
    output: Option<(PathBuf, TicketTable)>,
}

impl FileCheckpoint {
    /// Checkpoint writing only the memory file.
    #[must_use]
    pub fn new(memory_path: impl Into<PathBuf>) -> Self {
        Self {
            memory_path: memory_path.into(),
            output: None,
        }
    }

    /// Also write `table` with a `Category` column to `path`, as CSV when
    /// `path` ends in `.csv` and as JSON otherwise.
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>, table: TicketTable) -> Self {
        self.output = Some((path.into(), table));
        self
    }

    /// Memory file path.
    #[must_use]
    pub fn memory_path(&self) -> &Path {
        &self.memory_path
    }

    /// Overwrite the memory file with an empty store.
    ///
    /// # Errors
    /// `Io` if the file cannot be written.
    pub fn reset_memory(&self) -> Result<(), CheckpointError> {
        tracing::debug!(path = %self.memory_path.display(), "resetting category memory");
        write_file(&self.memory_path, MEMORY_FILE_EMPTY)
    }
}

impl Checkpoint for FileCheckpoint {
    fn begin(&mut self, _store: &CategoryStore) -> Result<(), CheckpointError> {
        self.reset_memory()
    }

    fn save(&mut self, store: &CategoryStore, run: &RunState) -> Result<(), CheckpointError> {
        write_file(&self.memory_path, &store.to_json()?)?;

        if let Some((path, table)) = &self.output {
            let labeled = match TableFormat::from_path(path) {
                TableFormat::Json => {
                    serde_json::to_string_pretty(&table.with_labels(run.labels()))?
                }
                TableFormat::Csv => table.labeled_csv(run.labels())?,
            };
            write_file(path, &labeled)?;
        }

        tracing::trace!(
            categories = store.len(),
            iteration = run.iterations(),
            "checkpoint saved"
        );
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), CheckpointError> {
    std::fs::write(path, contents).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}
