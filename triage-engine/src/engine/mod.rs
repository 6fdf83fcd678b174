//! Categorization Engine - the online decision loop
//!
//! `TigerStyle`: One action per iteration, every iteration checkpointed,
//! all collaborators injected.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Categorizer<E, O>                         │
//! │  observe ──▶ SchedulerState ──▶ decide_next_action        │
//! │                                    │                      │
//! │   ┌────────────┬──────────┬────────┴─┬──────────┬──────┐  │
//! │   ▼            ▼          ▼          ▼          ▼      │  │
//! │ assign     synthesize   merge     rename     adjust    │  │
//! │ (E)        (E, O)       (O)       (pure)     (O)       │  │
//! │   └────────────┴──────────┴──────────┴──────────┘      │  │
//! │                    CategoryStore + RunState             │  │
//! │                         │                               │  │
//! │                    Checkpoint::save                     │  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use triage_engine::checkpoint::NoCheckpoint;
//! use triage_engine::engine::Categorizer;
//! use triage_engine::tickets::Ticket;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut engine = Categorizer::sim(42);
//!     let report = engine
//!         .run(vec![Ticket::new(0, "printer not working")], &mut NoCheckpoint)
//!         .await
//!         .unwrap();
//!     assert_eq!(report.labels, vec![Some("Printer Issue".to_string())]);
//! }
//! ```

mod assignment;
mod config;
mod merge;
mod rename;
mod scheduler;
mod synthesis;
mod threshold;

pub use assignment::{assign, Assignment};
pub use config::{CreationMode, TerminationMode, TriageConfig};
pub use merge::{MergeAdvisor, MergeProposal};
pub use rename::{canonical_name, RenameAdvisor, RenameProposal};
pub use scheduler::{
    decide_next_action, Action, ActionCounts, RunReport, RunState, SchedulerState, StepOutcome,
};
pub use synthesis::{
    resolve_category_name, synthesize, synthesize_from_embedding, Synthesis, SynthesisError,
};
pub use threshold::{ThresholdAdjustment, ThresholdAdvice, ThresholdController};

use crate::category::CategoryStore;
use crate::checkpoint::Checkpoint;
use crate::config::ConfigError;
use crate::constants::{CATEGORY_NAME_BYTES_MAX, CATEGORY_UNCATEGORIZED_LABEL};
use crate::embedding::{EmbeddingProvider, SimEmbeddingProvider};
use crate::error::TriageError;
use crate::llm::SimLLMProvider;
use crate::oracle::{CategoryOracle, LlmOracle, OracleError};
use crate::tickets::{Ticket, TicketError};

// =============================================================================
// Categorizer
// =============================================================================

/// Online categorization engine.
///
/// Owns the category store for one run; the embedding provider and the
/// oracle are injected.
#[derive(Debug)]
pub struct Categorizer<E, O> {
    embedder: E,
    oracle: O,
    config: TriageConfig,
    store: CategoryStore,
    merge_advisor: MergeAdvisor,
    rename_advisor: RenameAdvisor,
    threshold_controller: ThresholdController,
}

impl Categorizer<SimEmbeddingProvider, LlmOracle<SimLLMProvider>> {
    /// Engine on deterministic simulation providers.
    #[must_use]
    pub fn sim(seed: u64) -> Self {
        let embedder = SimEmbeddingProvider::with_seed(seed);
        let oracle = LlmOracle::new(SimLLMProvider::with_seed(seed));
        Self::build(embedder, oracle, TriageConfig::default())
    }
}

impl<E, O> Categorizer<E, O>
where
    E: EmbeddingProvider,
    O: CategoryOracle,
{
    /// Create an engine with an empty store.
    ///
    /// # Errors
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(embedder: E, oracle: O, config: TriageConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(embedder, oracle, config))
    }

    fn build(embedder: E, oracle: O, config: TriageConfig) -> Self {
        let merge_advisor = MergeAdvisor::new(config.merge_examples);
        let threshold_controller = ThresholdController::new(
            config.threshold_step,
            config.threshold_min,
            config.threshold_max,
        );
        Self {
            embedder,
            oracle,
            config,
            store: CategoryStore::new(),
            merge_advisor,
            rename_advisor: RenameAdvisor,
            threshold_controller,
        }
    }

    /// Start from an existing store instead of an empty one.
    #[must_use]
    pub fn with_store(mut self, store: CategoryStore) -> Self {
        self.store = store;
        self
    }

    /// Current category store.
    #[must_use]
    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Consume the engine, keeping the store.
    #[must_use]
    pub fn into_store(self) -> CategoryStore {
        self.store
    }

    /// Fresh run state for `tickets` at the configured starting threshold.
    ///
    /// # Errors
    /// `IndexOutOfOrder` if ticket indices are not their list positions.
    pub fn start(&self, tickets: Vec<Ticket>) -> Result<RunState, TicketError> {
        RunState::new(tickets, self.config.initial_threshold)
    }

    /// Process every ticket, then run optimization passes until the
    /// termination mode says stop. Checkpoints after every iteration.
    ///
    /// # Errors
    /// Misnumbered tickets are rejected before anything is written. Oracle,
    /// embedding, store, and checkpoint failures abort the run.
    #[tracing::instrument(skip(self, tickets, checkpoint), fields(tickets = tickets.len(), oracle = self.oracle.name(), embedder = self.embedder.name()))]
    pub async fn run<C>(
        &mut self,
        tickets: Vec<Ticket>,
        checkpoint: &mut C,
    ) -> Result<RunReport, TriageError>
    where
        C: Checkpoint + ?Sized,
    {
        let mut run = self.start(tickets)?;
        checkpoint.begin(&self.store)?;

        loop {
            let ticket_phase = run.has_ticket_work();
            let outcome = self.step(&mut run).await?;
            checkpoint.save(&self.store, &run)?;

            if !ticket_phase {
                run.record_pass(outcome.changed);
                if !self.optimizations_possible(&run) {
                    break;
                }
            }
        }

        tracing::info!(
            iterations = run.iterations(),
            categories = self.store.len(),
            threshold = run.threshold(),
            "run complete"
        );
        Ok(run.into_report(&self.store))
    }

    /// Observe, decide, and execute exactly one action.
    ///
    /// # Errors
    /// Oracle, embedding, and store creation failures propagate. Merges and
    /// renames the store rejects are logged and count as no-ops.
    #[tracing::instrument(skip(self, run), fields(iteration = run.iterations()))]
    pub async fn step(&mut self, run: &mut RunState) -> Result<StepOutcome, TriageError> {
        let state = self.observe(run).await?;
        let action = decide_next_action(state);
        tracing::info!(action = action.kind(), pending = run.pending_count(), "action chosen");

        let changed = match &action {
            Action::AssignOrCreate => self.assign_or_create(run).await?,
            Action::Create => self.create_deferred(run).await?,
            Action::Merge(proposal) => self.apply_merge(proposal, run),
            Action::Rename(proposal) => self.apply_rename(proposal, run),
            Action::AdjustThreshold => self.adjust_threshold(run).await?,
        };

        run.iterations += 1;
        Ok(StepOutcome { action, changed })
    }

    /// Build the state vector. The merge scan runs every iteration when
    /// eager, otherwise only once no ticket work is left.
    async fn observe(&self, run: &RunState) -> Result<SchedulerState, OracleError> {
        let tickets_pending = run.pending_count() > 0;
        let creation_needed = run.deferred_count() > 0;

        let merge_available = if self.config.eager_merge_scan || !run.has_ticket_work() {
            self.merge_advisor.find_merge(&self.store, &self.oracle).await?
        } else {
            None
        };
        let rename_available = self.rename_advisor.find_rename(&self.store);

        Ok(SchedulerState {
            tickets_pending,
            creation_needed,
            merge_available,
            rename_available,
        })
    }

    fn optimizations_possible(&self, run: &RunState) -> bool {
        match self.config.termination_mode {
            TerminationMode::SinglePass => false,
            TerminationMode::FixedPoint => {
                run.last_pass_changed
                    && run.optimization_passes() < self.config.optimization_passes_max
            }
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    async fn assign_or_create(&mut self, run: &mut RunState) -> Result<bool, TriageError> {
        let Some(index) = run.pop_pending() else {
            return Ok(false);
        };

        if let Some(embedding) = self.assign_ticket(index, run).await? {
            match self.config.creation_mode {
                CreationMode::Immediate => {
                    self.place_in_new_category(index, embedding, run).await?;
                }
                CreationMode::Deferred => {
                    tracing::debug!(ticket = index, "creation deferred");
                    run.deferred.push_back(index);
                    run.actions.deferred += 1;
                }
            }
        }
        Ok(true)
    }

    async fn create_deferred(&mut self, run: &mut RunState) -> Result<bool, TriageError> {
        let Some(index) = run.deferred.pop_front() else {
            return Ok(false);
        };

        if let Some(embedding) = self.assign_ticket(index, run).await? {
            self.place_in_new_category(index, embedding, run).await?;
        }
        Ok(true)
    }

    /// Try to place ticket `index`. Returns its embedding if it matched
    /// nothing.
    async fn assign_ticket(
        &mut self,
        index: usize,
        run: &mut RunState,
    ) -> Result<Option<Vec<f32>>, TriageError> {
        let ticket = run.tickets[index].clone();
        let outcome = assign(&ticket.text, &self.store, run.threshold, &self.embedder).await?;

        match outcome {
            Assignment::Matched {
                category,
                similarity,
                embedding,
            } => {
                let count = self
                    .store
                    .add_example(&category, ticket.example(), &embedding)?;
                tracing::info!(ticket = index, %category, similarity, examples = count, "assigned");
                run.label(index, &category);
                run.actions.assigned += 1;
                Ok(None)
            }
            Assignment::Unmatched { embedding, .. } => Ok(Some(embedding)),
        }
    }

    async fn place_in_new_category(
        &mut self,
        index: usize,
        embedding: Vec<f32>,
        run: &mut RunState,
    ) -> Result<(), TriageError> {
        let ticket = run.tickets[index].clone();
        let synthesis = synthesize_from_embedding(&ticket.text, embedding, &self.oracle).await?;

        let mut name = synthesis.category_name();
        if name.len() > CATEGORY_NAME_BYTES_MAX {
            tracing::warn!(
                ticket = index,
                bytes = name.len(),
                "suggested name too long, using fallback label"
            );
            name = CATEGORY_UNCATEGORIZED_LABEL.to_string();
        }

        if self.store.contains(&name) {
            // Name already taken: the ticket joins that category.
            self.store
                .add_example(&name, ticket.example(), &synthesis.embedding)?;
            tracing::info!(ticket = index, category = %name, "joined existing category by name");
            run.actions.assigned += 1;
        } else {
            self.store
                .create(name.clone(), ticket.example(), synthesis.embedding)?;
            tracing::info!(ticket = index, category = %name, "category created");
            run.actions.created += 1;
        }

        run.label(index, &name);
        Ok(())
    }

    fn apply_merge(&mut self, proposal: &MergeProposal, run: &mut RunState) -> bool {
        match self.store.merge(&proposal.target, &proposal.source) {
            Ok(()) => {
                let moved = run.relabel(&proposal.source, &proposal.target);
                tracing::info!(
                    into = %proposal.target,
                    from = %proposal.source,
                    relabeled = moved,
                    "categories merged"
                );
                run.actions.merged += 1;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "merge skipped");
                run.actions.skipped += 1;
                false
            }
        }
    }

    fn apply_rename(&mut self, proposal: &RenameProposal, run: &mut RunState) -> bool {
        match self.store.rename(&proposal.old, proposal.new.clone()) {
            Ok(()) => {
                let moved = run.relabel(&proposal.old, &proposal.new);
                tracing::info!(old = %proposal.old, new = %proposal.new, relabeled = moved, "category renamed");
                run.actions.renamed += 1;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "rename skipped");
                run.actions.skipped += 1;
                false
            }
        }
    }

    async fn adjust_threshold(&mut self, run: &mut RunState) -> Result<bool, TriageError> {
        let adjustment = self
            .threshold_controller
            .adjust(&self.store, run.threshold, &self.oracle)
            .await?;

        tracing::info!(
            advice = ?adjustment.advice,
            from = adjustment.previous,
            to = adjustment.threshold,
            "threshold consulted"
        );
        run.threshold = adjustment.threshold;
        run.actions.threshold_adjustments += 1;
        Ok(adjustment.changed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{MemoryCheckpoint, NoCheckpoint};
    use crate::oracle::{OracleCall, ScriptedOracle};

    fn tickets(texts: &[&str]) -> Vec<Ticket> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Ticket::new(i, *t))
            .collect()
    }

    fn engine(oracle: ScriptedOracle) -> Categorizer<SimEmbeddingProvider, ScriptedOracle> {
        Categorizer::new(SimEmbeddingProvider::with_seed(7), oracle, TriageConfig::default())
            .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Categorizer::new(
            SimEmbeddingProvider::with_seed(1),
            ScriptedOracle::new(),
            TriageConfig::default().with_threshold(2.0),
        );
        assert!(matches!(result, Err(ConfigError::InvalidThreshold { .. })));
    }

    #[tokio::test]
    async fn test_single_ticket_creates_category() {
        let oracle = ScriptedOracle::new().with_names(["Printer Issue\nPrinters jam."]);
        let mut engine = engine(oracle);

        let report = engine
            .run(tickets(&["printer not working"]), &mut NoCheckpoint)
            .await
            .unwrap();

        assert_eq!(report.labels, vec![Some("Printer Issue".into())]);
        assert_eq!(report.categories, vec!["Printer Issue".to_string()]);
        assert_eq!(report.actions.created, 1);
        // one ticket iteration, one optimization pass
        assert_eq!(report.iterations, 2);
        assert_eq!(report.optimization_passes, 1);
        assert_eq!(report.actions.threshold_adjustments, 1);
    }

    #[tokio::test]
    async fn test_identical_ticket_is_assigned() {
        let oracle = ScriptedOracle::new().with_names(["VPN"]);
        let mut engine = engine(oracle);

        let report = engine
            .run(tickets(&["vpn drops", "vpn drops"]), &mut NoCheckpoint)
            .await
            .unwrap();

        assert_eq!(report.labels, vec![Some("VPN".into()), Some("VPN".into())]);
        assert_eq!(report.actions.created, 1);
        assert_eq!(report.actions.assigned, 1);
        assert_eq!(engine.store().get("VPN").unwrap().example_count(), 2);
    }

    #[tokio::test]
    async fn test_taken_name_joins_existing_category() {
        let oracle = ScriptedOracle::new().with_names(["Misc", "Misc"]);
        let mut engine = engine(oracle);

        let report = engine
            .run(
                tickets(&["keyboard sticky", "monitor flickers at night"]),
                &mut NoCheckpoint,
            )
            .await
            .unwrap();

        assert_eq!(report.categories, vec!["Misc".to_string()]);
        assert_eq!(report.labels, vec![Some("Misc".into()), Some("Misc".into())]);
        assert_eq!(engine.store().get("Misc").unwrap().example_count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_name_falls_back() {
        let long = "x".repeat(CATEGORY_NAME_BYTES_MAX + 1);
        let oracle = ScriptedOracle::new().with_names([long]);
        let mut engine = engine(oracle);

        let report = engine
            .run(tickets(&["something odd"]), &mut NoCheckpoint)
            .await
            .unwrap();
        assert_eq!(report.labels, vec![Some(CATEGORY_UNCATEGORIZED_LABEL.into())]);
    }

    #[tokio::test]
    async fn test_merge_relabels_tickets() {
        let mut store = CategoryStore::new();
        store.create("Network Issue", "wifi down", vec![1.0, 0.0]).unwrap();
        store.create("Network Outage", "lan down", vec![1.0, 0.0]).unwrap();

        let oracle = ScriptedOracle::new().with_merges(["YES"]);
        let mut engine = engine(oracle).with_store(store);
        let mut run = engine.start(Vec::new()).unwrap();
        run.labels = vec![Some("Network Outage".into())];

        let outcome = engine.step(&mut run).await.unwrap();

        assert_eq!(
            outcome.action,
            Action::Merge(MergeProposal {
                target: "Network Issue".into(),
                source: "Network Outage".into(),
            })
        );
        assert!(outcome.changed);
        assert_eq!(run.labels(), &[Some("Network Issue".into())]);
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.store().get("Network Issue").unwrap().example_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_merge_is_noop() {
        let mut store = CategoryStore::new();
        store.create("A", "a", vec![1.0]).unwrap();
        let mut engine = engine(ScriptedOracle::new()).with_store(store.clone());
        let mut run = engine.start(Vec::new()).unwrap();

        let changed = engine.apply_merge(
            &MergeProposal {
                target: "A".into(),
                source: "Gone".into(),
            },
            &mut run,
        );

        assert!(!changed);
        assert_eq!(run.actions().skipped, 1);
        assert_eq!(engine.store(), &store);
    }

    #[tokio::test]
    async fn test_rename_runs_after_merge_check() {
        let mut store = CategoryStore::new();
        store.create("\"Billing\"", "refund", vec![1.0, 0.0]).unwrap();
        let mut engine = engine(ScriptedOracle::new()).with_store(store);
        let mut run = engine.start(Vec::new()).unwrap();
        run.labels = vec![Some("\"Billing\"".into())];

        let outcome = engine.step(&mut run).await.unwrap();

        assert_eq!(outcome.action.kind(), "rename");
        assert!(engine.store().contains("Billing"));
        assert_eq!(run.labels(), &[Some("Billing".into())]);
    }

    #[tokio::test]
    async fn test_lazy_merge_scan_skips_oracle_during_tickets() {
        let oracle = ScriptedOracle::new().with_names(["A", "B", "C"]);
        let config = TriageConfig::default()
            .with_threshold(0.99)
            .without_eager_merge_scan();
        let mut engine =
            Categorizer::new(SimEmbeddingProvider::with_seed(7), oracle, config).unwrap();

        engine
            .run(
                tickets(&["alpha one", "beta two", "gamma three"]),
                &mut NoCheckpoint,
            )
            .await
            .unwrap();

        // 3 categories exist only on the final pass: 3 pairs asked once.
        assert_eq!(engine.oracle.merge_calls(), 3);
    }

    #[tokio::test]
    async fn test_eager_merge_scan_runs_every_iteration() {
        let oracle = ScriptedOracle::new().with_names(["A", "B", "C"]);
        let config = TriageConfig::default().with_threshold(0.99);
        let mut engine =
            Categorizer::new(SimEmbeddingProvider::with_seed(7), oracle, config).unwrap();

        engine
            .run(
                tickets(&["alpha one", "beta two", "gamma three"]),
                &mut NoCheckpoint,
            )
            .await
            .unwrap();

        // Before each iteration: 0, 0, 1, then 3 pairs on the final pass.
        assert_eq!(engine.oracle.merge_calls(), 4);
    }

    #[tokio::test]
    async fn test_checkpoint_every_iteration() {
        let oracle = ScriptedOracle::new().with_names(["A", "B"]);
        let config = TriageConfig::default().with_threshold(0.99);
        let mut engine =
            Categorizer::new(SimEmbeddingProvider::with_seed(7), oracle, config).unwrap();
        let mut checkpoint = MemoryCheckpoint::new();

        let report = engine
            .run(tickets(&["alpha one", "beta two"]), &mut checkpoint)
            .await
            .unwrap();

        assert!(checkpoint.began());
        assert_eq!(checkpoint.saves().len(), report.iterations);
        assert_eq!(checkpoint.saves()[0].1, vec![Some("A".into()), None]);
        assert_eq!(checkpoint.last().unwrap().0, engine.store().snapshot());
    }

    #[tokio::test]
    async fn test_naming_uses_ticket_text_and_example_uses_summary() {
        let oracle = ScriptedOracle::new().with_names(["Printer Issue"]);
        let mut engine = engine(oracle);
        let ticket = Ticket::new(0, "laser printer shows paper jam").with_summary("Paper jam");

        engine.run(vec![ticket], &mut NoCheckpoint).await.unwrap();

        assert_eq!(
            engine.oracle.calls()[0],
            OracleCall::SuggestName {
                tickets: vec!["laser printer shows paper jam".into()]
            }
        );
        assert_eq!(
            engine.store().get("Printer Issue").unwrap().examples(),
            &["Paper jam".to_string()]
        );
    }
}
