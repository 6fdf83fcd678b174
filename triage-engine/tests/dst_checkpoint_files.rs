//! DST: Ticket files in, memory and labeled output files out
//!
//! Runs the simulation engine against real files in a temp directory and
//! checks what lands on disk.

use serde_json::Value;
use triage_engine::checkpoint::FileCheckpoint;
use triage_engine::engine::Categorizer;
use triage_engine::tickets::{TicketTable, SUMMARY_COLUMN};
use triage_engine::CategoryStore;

const TICKETS_JSON: &str = r#"[
    {"Id": 1, "Title": "Printer", "Details": "printer not working since this morning", "Summary*": "Printer down"},
    {"Id": 2, "Title": "VPN", "Details": "vpn keeps disconnecting every few minutes", "Summary*": "VPN drops"},
    {"Id": 3, "Title": "Printer", "Details": "printer not working since this morning", "Summary*": "Printer down again"}
]"#;

#[test]
fn test_dst_text_column_is_longest_string_column() {
    let table = TicketTable::from_json_str(TICKETS_JSON).unwrap();

    assert_eq!(table.text_column(), "Details");
    assert_eq!(table.summary_column(), Some(SUMMARY_COLUMN));

    let tickets = table.tickets();
    assert_eq!(tickets[1].text, "vpn keeps disconnecting every few minutes");
    assert_eq!(tickets[1].example(), "VPN drops");
}

#[tokio::test]
async fn test_dst_run_writes_memory_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tickets.json");
    let memory = dir.path().join("category_memory.json");
    let output = dir.path().join("tickets_categorized.json");
    std::fs::write(&input, TICKETS_JSON).unwrap();
    std::fs::write(&memory, r#"{"categories": {"Stale": {"examples": ["old"], "embedding": [1.0]}}}"#)
        .unwrap();

    let table = TicketTable::from_path(&input).unwrap();
    let mut checkpoint = FileCheckpoint::new(&memory).with_output(&output, table.clone());
    let mut engine = Categorizer::sim(42);

    let report = engine.run(table.tickets(), &mut checkpoint).await.unwrap();

    // Memory file holds this run's store only.
    let saved = CategoryStore::from_json(&std::fs::read_to_string(&memory).unwrap()).unwrap();
    assert_eq!(&saved, engine.store());
    assert!(!saved.contains("Stale"));

    let printer = saved.get("Printer Issue").unwrap();
    assert_eq!(
        printer.examples(),
        &["Printer down".to_string(), "Printer down again".to_string()]
    );

    // Output rows keep their columns and gain a label.
    let rows: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for (row, label) in rows.iter().zip(&report.labels) {
        assert_eq!(row["Category"].as_str(), label.as_deref());
        assert!(row.get("Id").is_some());
    }
    assert_eq!(rows[0]["Category"], "Printer Issue");
    assert_eq!(rows[1]["Category"], "Network Issue");
}

#[tokio::test]
async fn test_dst_memory_file_schema() {
    let dir = tempfile::tempdir().unwrap();
    let memory = dir.path().join("category_memory.json");
    let table = TicketTable::from_json_str(TICKETS_JSON).unwrap();
    let mut checkpoint = FileCheckpoint::new(&memory);

    Categorizer::sim(42)
        .run(table.tickets(), &mut checkpoint)
        .await
        .unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&memory).unwrap()).unwrap();
    let categories = raw["categories"].as_object().unwrap();
    let names: Vec<&str> = categories.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Printer Issue", "Network Issue"]);

    for record in categories.values() {
        assert!(record["examples"].is_array());
        assert_eq!(record["embedding"].as_array().unwrap().len(), 384);
    }
}
