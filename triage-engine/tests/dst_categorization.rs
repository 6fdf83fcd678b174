//! DST: Categorization runs end to end
//!
//! Drives `Categorizer` with seeded simulation providers and scripted
//! oracles. Same seed, same run.

use std::sync::Arc;

use triage_engine::checkpoint::{MemoryCheckpoint, NoCheckpoint};
use triage_engine::dst::{DeterministicRng, FaultConfig, FaultInjectorBuilder, FaultType};
use triage_engine::embedding::SimEmbeddingProvider;
use triage_engine::engine::{
    Action, Categorizer, CreationMode, MergeProposal, TerminationMode, TriageConfig,
};
use triage_engine::llm::SimLLMProvider;
use triage_engine::oracle::{LlmOracle, ScriptedOracle};
use triage_engine::tickets::{Ticket, TicketError, TicketTable};
use triage_engine::{CategoryStore, TriageError};

fn tickets(texts: &[&str]) -> Vec<Ticket> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Ticket::new(i, *t))
        .collect()
}

fn scripted_engine(
    oracle: ScriptedOracle,
    config: TriageConfig,
) -> Categorizer<SimEmbeddingProvider, ScriptedOracle> {
    Categorizer::new(SimEmbeddingProvider::with_seed(42), oracle, config).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_dst_first_ticket_creates_named_category() {
    let table = TicketTable::from_json_str(r#"[{"Description": "printer not working"}]"#).unwrap();
    let oracle = ScriptedOracle::new().with_names(["Printer Issue"]);
    let mut engine = scripted_engine(oracle, TriageConfig::default());
    let mut run = engine.start(table.tickets()).unwrap();

    let outcome = engine.step(&mut run).await.unwrap();

    assert_eq!(outcome.action, Action::AssignOrCreate);
    assert_eq!(engine.store().len(), 1);
    let category = engine.store().get("Printer Issue").unwrap();
    assert_eq!(category.examples(), &["printer not working".to_string()]);
    assert_eq!(run.pending_count(), 0);

    let output = table.with_labels(run.labels());
    assert_eq!(output[0]["Category"], "Printer Issue");
}

#[tokio::test]
async fn test_dst_merge_scan_folds_identical_categories() {
    let mut store = CategoryStore::new();
    store.create("Network Issue", "wifi drops", vec![1.0, 0.0]).unwrap();
    store.add_example("Network Issue", "vpn slow", &[1.0, 0.0]).unwrap();
    store.create("Network Outage", "lan down", vec![1.0, 0.0]).unwrap();

    let oracle = ScriptedOracle::new().with_merges(["YES"]);
    let mut engine = scripted_engine(oracle, TriageConfig::default()).with_store(store);
    let mut run = engine.start(Vec::new()).unwrap();

    let outcome = engine.step(&mut run).await.unwrap();

    assert_eq!(
        outcome.action,
        Action::Merge(MergeProposal {
            target: "Network Issue".into(),
            source: "Network Outage".into(),
        })
    );
    assert_eq!(engine.store().len(), 1);
    let merged = engine.store().get("Network Issue").unwrap();
    assert_eq!(
        merged.examples(),
        &[
            "wifi drops".to_string(),
            "vpn slow".to_string(),
            "lan down".to_string()
        ]
    );
    assert_eq!(merged.centroid(), &[1.0, 0.0]);
}

#[tokio::test]
async fn test_dst_sim_oracle_merges_shared_leading_word() {
    let mut store = CategoryStore::new();
    store.create("Network Issue", "wifi drops", vec![0.0, 1.0]).unwrap();
    store.create("Network Outage", "lan down", vec![0.0, 1.0]).unwrap();

    let oracle = LlmOracle::new(SimLLMProvider::with_seed(42));
    let mut engine = Categorizer::new(
        SimEmbeddingProvider::with_seed(42),
        oracle,
        TriageConfig::default(),
    )
    .unwrap()
    .with_store(store);

    let report = engine.run(Vec::new(), &mut NoCheckpoint).await.unwrap();

    assert_eq!(report.categories, vec!["Network Issue".to_string()]);
    assert_eq!(report.actions.merged, 1);
}

#[tokio::test]
async fn test_dst_sim_run_groups_tickets() {
    let mut engine = Categorizer::sim(42);

    let report = engine
        .run(
            tickets(&[
                "printer not working",
                "vpn keeps disconnecting",
                "printer not working",
                "forgot my password",
            ]),
            &mut NoCheckpoint,
        )
        .await
        .unwrap();

    let labels: Vec<_> = report.labels.iter().map(|l| l.as_deref()).collect();
    assert_eq!(
        labels,
        vec![
            Some("Printer Issue"),
            Some("Network Issue"),
            Some("Printer Issue"),
            Some("Access Request"),
        ]
    );
    assert_eq!(
        report.categories,
        vec!["Printer Issue", "Network Issue", "Access Request"]
    );
    assert_eq!(report.actions.created, 3);
    assert_eq!(report.actions.assigned, 1);

    // 3 categories, 4/3 examples each: the sim oracle asks for a lower bar.
    assert!((report.threshold - 0.70).abs() < 1e-9);
}

#[tokio::test]
async fn test_dst_same_seed_same_run() {
    let texts = [
        "monitor flickers",
        "cannot install license",
        "outlook inbox full",
        "cannot install license",
    ];

    let first = Categorizer::sim(7)
        .run(tickets(&texts), &mut NoCheckpoint)
        .await
        .unwrap();
    let second = Categorizer::sim(7)
        .run(tickets(&texts), &mut NoCheckpoint)
        .await
        .unwrap();

    assert_eq!(first, second);
}

// =============================================================================
// Scheduling Modes
// =============================================================================

#[tokio::test]
async fn test_dst_deferred_creation_retries_assignment() {
    let oracle = ScriptedOracle::new().with_names(["Printer Issue", "Network Issue"]);
    let config = TriageConfig::default().with_creation_mode(CreationMode::Deferred);
    let mut engine = scripted_engine(oracle, config);

    let report = engine
        .run(
            tickets(&[
                "printer jam on floor two",
                "vpn drops hourly",
                "printer jam on floor two",
            ]),
            &mut NoCheckpoint,
        )
        .await
        .unwrap();

    assert_eq!(
        report.labels,
        vec![
            Some("Printer Issue".into()),
            Some("Network Issue".into()),
            Some("Printer Issue".into()),
        ]
    );
    assert_eq!(report.actions.deferred, 3);
    assert_eq!(report.actions.created, 2);
    // The repeat ticket matched on retry; no third name was requested.
    assert_eq!(report.actions.assigned, 1);
    // 3 deferrals, 3 creates, 1 optimization pass
    assert_eq!(report.iterations, 7);
}

#[tokio::test]
async fn test_dst_deferred_creation_matches_on_retry() {
    let oracle = ScriptedOracle::new().with_names(["Printer Issue", "Network Issue"]);
    let config = TriageConfig::default().with_creation_mode(CreationMode::Deferred);
    let mut engine = scripted_engine(oracle, config);

    engine
        .run(
            tickets(&["printer jam", "vpn drops", "printer jam"]),
            &mut NoCheckpoint,
        )
        .await
        .unwrap();

    let engine_store = engine.into_store();
    assert_eq!(engine_store.get("Printer Issue").unwrap().example_count(), 2);
    assert_eq!(engine_store.get("Network Issue").unwrap().example_count(), 1);
}

#[tokio::test]
async fn test_dst_single_pass_runs_one_optimization_pass() {
    let oracle = ScriptedOracle::new()
        .with_names(["Printer Issue"])
        .with_default_threshold("INCREASE");
    let mut engine = scripted_engine(oracle, TriageConfig::default());

    let report = engine
        .run(tickets(&["printer jam"]), &mut NoCheckpoint)
        .await
        .unwrap();

    assert_eq!(report.optimization_passes, 1);
    assert!((report.threshold - 0.80).abs() < 1e-9);
}

#[tokio::test]
async fn test_dst_fixed_point_stops_when_nothing_changes() {
    let oracle = ScriptedOracle::new()
        .with_names(["Printer Issue"])
        .with_thresholds(["INCREASE", "INCREASE"]);
    let config = TriageConfig::default().with_termination_mode(TerminationMode::FixedPoint);
    let mut engine = scripted_engine(oracle, config);

    let report = engine
        .run(tickets(&["printer jam"]), &mut NoCheckpoint)
        .await
        .unwrap();

    // INCREASE, INCREASE, then KEEP changes nothing
    assert_eq!(report.optimization_passes, 3);
    assert_eq!(report.iterations, 4);
    assert!((report.threshold - 0.85).abs() < 1e-9);
}

#[tokio::test]
async fn test_dst_fixed_point_respects_pass_cap() {
    let oracle = ScriptedOracle::new()
        .with_names(["Printer Issue"])
        .with_default_threshold("INCREASE");
    let config = TriageConfig::default()
        .with_termination_mode(TerminationMode::FixedPoint)
        .with_optimization_passes_max(5);
    let mut engine = scripted_engine(oracle, config);

    let report = engine
        .run(tickets(&["printer jam"]), &mut NoCheckpoint)
        .await
        .unwrap();

    assert_eq!(report.optimization_passes, 5);
    assert!((report.threshold - 0.99).abs() < 1e-9);
}

#[tokio::test]
async fn test_dst_fixed_point_stops_without_merges() {
    let oracle = ScriptedOracle::new()
        .with_names(["Network Issue", "Network Outage", "Network Slowness"])
        .with_merges(["NO", "NO", "NO"]);
    let config = TriageConfig::default()
        .with_threshold(0.99)
        .with_termination_mode(TerminationMode::FixedPoint)
        .without_eager_merge_scan();
    let mut engine = scripted_engine(oracle, config);

    let report = engine
        .run(
            tickets(&["wifi drops", "lan cable dead", "bandwidth poor"]),
            &mut NoCheckpoint,
        )
        .await
        .unwrap();

    // Pass 1: (A,B) NO, (A,C) NO, (B,C) NO -> adjust KEEP, nothing changed.
    assert_eq!(report.optimization_passes, 1);
    assert_eq!(report.categories.len(), 3);
    assert_eq!(report.actions.merged, 0);
}

#[tokio::test]
async fn test_dst_fixed_point_repeats_while_merging() {
    let oracle = ScriptedOracle::new()
        .with_names(["Network Issue", "Network Outage", "Network Slowness"])
        .with_default_merge("YES");
    let config = TriageConfig::default()
        .with_threshold(0.99)
        .with_termination_mode(TerminationMode::FixedPoint)
        .without_eager_merge_scan();
    let mut engine = scripted_engine(oracle, config);

    let report = engine
        .run(
            tickets(&["wifi drops", "lan cable dead", "bandwidth poor"]),
            &mut NoCheckpoint,
        )
        .await
        .unwrap();

    // Two merges, then a KEEP pass with a single category.
    assert_eq!(report.actions.merged, 2);
    assert_eq!(report.optimization_passes, 3);
    assert_eq!(report.categories, vec!["Network Issue".to_string()]);
    assert!(report
        .labels
        .iter()
        .all(|l| l.as_deref() == Some("Network Issue")));
}

#[tokio::test]
async fn test_dst_rename_cleans_quoted_name() {
    let oracle = ScriptedOracle::new().with_names(["\"Billing\""]);
    let mut engine = scripted_engine(oracle, TriageConfig::default());

    let report = engine
        .run(tickets(&["refund not received"]), &mut NoCheckpoint)
        .await
        .unwrap();

    assert_eq!(report.categories, vec!["Billing".to_string()]);
    assert_eq!(report.labels, vec![Some("Billing".into())]);
    assert_eq!(report.actions.renamed, 1);
    // The rename took the single optimization pass; no threshold call.
    assert_eq!(report.actions.threshold_adjustments, 0);
}

#[tokio::test]
async fn test_dst_uncategorized_reply_becomes_label() {
    let oracle = ScriptedOracle::new().with_names(["I think this is uncategorized"]);
    let mut engine = scripted_engine(oracle, TriageConfig::default());

    let report = engine
        .run(tickets(&["???"]), &mut NoCheckpoint)
        .await
        .unwrap();

    assert_eq!(report.labels, vec![Some("Uncategorized".into())]);
}

// =============================================================================
// Fault Injection
// =============================================================================

#[tokio::test]
async fn test_dst_llm_fault_aborts_run() {
    let faults = Arc::new(
        FaultInjectorBuilder::new(DeterministicRng::new(42))
            .with_fault(FaultConfig::new(FaultType::LlmTimeout, 1.0))
            .build(),
    );
    let oracle = LlmOracle::new(SimLLMProvider::with_faults(42, faults));
    let mut engine = Categorizer::new(
        SimEmbeddingProvider::with_seed(42),
        oracle,
        TriageConfig::default(),
    )
    .unwrap();
    let mut checkpoint = MemoryCheckpoint::new();

    let err = engine
        .run(tickets(&["printer jam"]), &mut checkpoint)
        .await
        .unwrap_err();

    assert!(matches!(err, TriageError::Oracle(_)));
    assert!(checkpoint.began());
    assert!(checkpoint.saves().is_empty());
    assert!(engine.store().is_empty());
}

#[tokio::test]
async fn test_dst_embedding_fault_aborts_run() {
    let faults = Arc::new(
        FaultInjectorBuilder::new(DeterministicRng::new(42))
            .with_fault(FaultConfig::new(FaultType::EmbeddingTimeout, 1.0).after(1))
            .build(),
    );
    let embedder = SimEmbeddingProvider::with_faults(42, faults);
    let oracle = ScriptedOracle::new().with_names(["Printer Issue"]);
    let mut engine = Categorizer::new(embedder, oracle, TriageConfig::default()).unwrap();
    let mut checkpoint = MemoryCheckpoint::new();

    let err = engine
        .run(tickets(&["printer jam", "vpn drops"]), &mut checkpoint)
        .await
        .unwrap_err();

    assert!(matches!(err, TriageError::Embedding(_)));
    // The first ticket completed and was checkpointed before the fault.
    assert_eq!(checkpoint.saves().len(), 1);
    assert_eq!(checkpoint.saves()[0].1, vec![Some("Printer Issue".into()), None]);
}

#[tokio::test]
async fn test_dst_partial_llm_faults_never_corrupt_labels() {
    let texts = [
        "printer not working",
        "vpn keeps disconnecting",
        "forgot my password",
        "printer not working",
        "outlook inbox full",
    ];

    for seed in 0..20_u64 {
        let faults = Arc::new(
            FaultInjectorBuilder::new(DeterministicRng::new(seed))
                .with_llm_faults(0.2)
                .build(),
        );
        let oracle = LlmOracle::new(SimLLMProvider::with_faults(seed, faults));
        let mut engine = Categorizer::new(
            SimEmbeddingProvider::with_seed(seed),
            oracle,
            TriageConfig::default(),
        )
        .unwrap();
        let mut checkpoint = MemoryCheckpoint::new();

        match engine.run(tickets(&texts), &mut checkpoint).await {
            Ok(report) => {
                assert!(report.labels.iter().all(Option::is_some), "seed {seed}");
            }
            Err(err) => {
                assert!(matches!(err, TriageError::Oracle(_)), "seed {seed}: {err}");
            }
        }

        // Every checkpoint only labels tickets with categories it holds.
        for (snapshot, labels) in checkpoint.saves() {
            let names: Vec<&str> = snapshot.categories.iter().map(|(n, _)| n.as_str()).collect();
            for label in labels.iter().flatten() {
                assert!(names.contains(&label.as_str()), "seed {seed}: {label}");
            }
        }
    }
}

#[tokio::test]
async fn test_dst_misnumbered_tickets_rejected_before_checkpoint() {
    let tickets = vec![Ticket::new(0, "printer not working"), Ticket::new(5, "vpn down")];
    let mut engine = Categorizer::sim(42);
    let mut checkpoint = MemoryCheckpoint::new();

    let err = engine.run(tickets, &mut checkpoint).await.unwrap_err();

    assert!(matches!(
        err,
        TriageError::Ticket(TicketError::IndexOutOfOrder {
            position: 1,
            index: 5
        })
    ));
    assert!(!checkpoint.began());
    assert!(engine.store().is_empty());
}
