//! Decision Scheduler - one action per iteration, strict priority.
//!
//! `TigerStyle`: The decision is a pure function of an explicit state vector;
//! all I/O happens before (observation) and after (execution) it.

use std::collections::{BTreeSet, VecDeque};

use super::merge::MergeProposal;
use super::rename::RenameProposal;
use crate::category::CategoryStore;
use crate::tickets::{Ticket, TicketError};

// =============================================================================
// State Vector and Actions
// =============================================================================

/// What the scheduler sees at the start of an iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// At least one ticket is still pending
    pub tickets_pending: bool,
    /// The deferred creation queue is non-empty
    pub creation_needed: bool,
    /// First merge the oracle approved, if a scan ran and found one
    pub merge_available: Option<MergeProposal>,
    /// First rename the advisor proposes
    pub rename_available: Option<RenameProposal>,
}

/// The single action an iteration performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Pop a pending ticket, assign it or handle the miss
    AssignOrCreate,
    /// Pop a deferred ticket, retry assignment, synthesize on a miss
    Create,
    /// Fold `source` into `target`
    Merge(MergeProposal),
    /// Rename a category to its canonical form
    Rename(RenameProposal),
    /// Ask the oracle to recalibrate the threshold
    AdjustThreshold,
}

impl Action {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssignOrCreate => "assign_or_create",
            Self::Create => "create",
            Self::Merge(_) => "merge",
            Self::Rename(_) => "rename",
            Self::AdjustThreshold => "adjust_threshold",
        }
    }
}

/// Pick the next action. Total: every state maps to exactly one action.
///
/// ```rust
/// use triage_engine::engine::{decide_next_action, Action, SchedulerState};
///
/// let state = SchedulerState { tickets_pending: true, ..Default::default() };
/// assert_eq!(decide_next_action(state), Action::AssignOrCreate);
/// assert_eq!(decide_next_action(SchedulerState::default()), Action::AdjustThreshold);
/// ```
#[must_use]
pub fn decide_next_action(state: SchedulerState) -> Action {
    if state.tickets_pending {
        return Action::AssignOrCreate;
    }
    if state.creation_needed {
        return Action::Create;
    }
    if let Some(proposal) = state.merge_available {
        return Action::Merge(proposal);
    }
    if let Some(proposal) = state.rename_available {
        return Action::Rename(proposal);
    }
    Action::AdjustThreshold
}

// =============================================================================
// Run State
// =============================================================================

/// Tally of actions taken during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    /// Tickets placed in an existing category
    pub assigned: usize,
    /// Categories created
    pub created: usize,
    /// Tickets queued for deferred creation
    pub deferred: usize,
    /// Merges applied
    pub merged: usize,
    /// Renames applied
    pub renamed: usize,
    /// Threshold consultations
    pub threshold_adjustments: usize,
    /// Merges or renames dropped because the store rejected them
    pub skipped: usize,
}

/// Mutable bookkeeping for one run.
///
/// The category store lives in the engine; everything else a run mutates
/// lives here.
#[derive(Debug, Clone)]
pub struct RunState {
    pub(crate) tickets: Vec<Ticket>,
    pub(crate) pending: BTreeSet<usize>,
    pub(crate) deferred: VecDeque<usize>,
    pub(crate) labels: Vec<Option<String>>,
    pub(crate) threshold: f64,
    pub(crate) iterations: usize,
    pub(crate) optimization_passes: usize,
    pub(crate) last_pass_changed: bool,
    pub(crate) actions: ActionCounts,
}

impl RunState {
    /// Fresh state: every ticket pending, nothing labeled.
    ///
    /// # Errors
    /// `IndexOutOfOrder` if ticket indices are not `0..tickets.len()` in
    /// order.
    pub fn new(tickets: Vec<Ticket>, threshold: f64) -> Result<Self, TicketError> {
        if let Some((position, ticket)) = tickets
            .iter()
            .enumerate()
            .find(|(position, ticket)| ticket.index != *position)
        {
            return Err(TicketError::IndexOutOfOrder {
                position,
                index: ticket.index,
            });
        }

        let pending = (0..tickets.len()).collect();
        let labels = vec![None; tickets.len()];
        Ok(Self {
            tickets,
            pending,
            deferred: VecDeque::new(),
            labels,
            threshold,
            iterations: 0,
            optimization_passes: 0,
            last_pass_changed: false,
            actions: ActionCounts::default(),
        })
    }

    /// All tickets of the run.
    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    /// Tickets not yet popped.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Tickets waiting for deferred creation.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// True while a pending or deferred ticket remains.
    #[must_use]
    pub fn has_ticket_work(&self) -> bool {
        !self.pending.is_empty() || !self.deferred.is_empty()
    }

    /// Label per ticket, `None` until the ticket is placed.
    #[must_use]
    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    /// Current similarity threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Iterations completed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Post-ticket optimization iterations completed.
    #[must_use]
    pub fn optimization_passes(&self) -> usize {
        self.optimization_passes
    }

    /// Action tally so far.
    #[must_use]
    pub fn actions(&self) -> ActionCounts {
        self.actions
    }

    pub(crate) fn pop_pending(&mut self) -> Option<usize> {
        self.pending.pop_first()
    }

    pub(crate) fn label(&mut self, index: usize, category: &str) {
        self.labels[index] = Some(category.to_string());
    }

    /// Point every label naming `from` at `to`.
    pub(crate) fn relabel(&mut self, from: &str, to: &str) -> usize {
        let mut moved = 0;
        for label in self.labels.iter_mut().flatten() {
            if label == from {
                *label = to.to_string();
                moved += 1;
            }
        }
        moved
    }

    pub(crate) fn record_pass(&mut self, changed: bool) {
        self.optimization_passes += 1;
        self.last_pass_changed = changed;
    }

    pub(crate) fn into_report(self, store: &CategoryStore) -> RunReport {
        RunReport {
            labels: self.labels,
            threshold: self.threshold,
            iterations: self.iterations,
            optimization_passes: self.optimization_passes,
            actions: self.actions,
            categories: store.names().map(str::to_string).collect(),
        }
    }
}

/// Result of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Action performed
    pub action: Action,
    /// Whether the store or the threshold changed
    pub changed: bool,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Final label per ticket
    pub labels: Vec<Option<String>>,
    /// Final threshold
    pub threshold: f64,
    /// Total iterations
    pub iterations: usize,
    /// Post-ticket optimization iterations
    pub optimization_passes: usize,
    /// Action tally
    pub actions: ActionCounts,
    /// Category names in creation order
    pub categories: Vec<String>,
}
