//! `triage` - categorize a ticket file from the command line.
//!
//! ```text
//! triage tickets.json --memory category_memory.json --output tickets_categorized.json
//! triage tickets.json --sim --seed 7 --termination fixed-point
//! triage tickets.csv --output tickets_categorized.csv
//! ```
//!
//! Credentials come from the environment (`.env` is loaded first):
//! `OPENROUTER_API_KEY` for the oracle and `OPENAI_API_KEY` for embeddings.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use triage_engine::checkpoint::FileCheckpoint;
use triage_engine::constants::{MERGE_EXAMPLES_COUNT_DEFAULT, THRESHOLD_DEFAULT};
use triage_engine::embedding::{EmbeddingProvider, SimEmbeddingProvider};
use triage_engine::engine::{Categorizer, CreationMode, TerminationMode, TriageConfig};
use triage_engine::llm::SimLLMProvider;
use triage_engine::oracle::{CategoryOracle, LlmOracle};
use triage_engine::telemetry::{init_tracing, TelemetryConfig, LOG_LEVEL_DEFAULT};
use triage_engine::tickets::TicketTable;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Termination {
    /// One optimization pass after the last ticket
    SinglePass,
    /// Repeat optimization passes until nothing changes
    FixedPoint,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Creation {
    /// Create a category as soon as a ticket misses
    Immediate,
    /// Queue misses and create after all tickets are assigned
    Deferred,
}

#[derive(Debug, Parser)]
#[command(name = "triage", version, about = "Categorize support tickets with embeddings and an LLM oracle")]
struct Cli {
    /// Ticket file: JSON array of row objects, or CSV with a header row
    input: PathBuf,

    /// Category memory file, reset at start and rewritten every iteration
    #[arg(long, env = "TRIAGE_MEMORY_FILE", default_value = "category_memory.json")]
    memory: PathBuf,

    /// Labeled output file, CSV if it ends in `.csv`
    #[arg(long, env = "TRIAGE_OUTPUT_FILE", default_value = "tickets_categorized.json")]
    output: PathBuf,

    /// Starting similarity threshold
    #[arg(long, default_value_t = THRESHOLD_DEFAULT)]
    threshold: f64,

    /// Examples per category shown in merge prompts
    #[arg(long, default_value_t = MERGE_EXAMPLES_COUNT_DEFAULT)]
    merge_examples: usize,

    /// Use deterministic simulation providers (no network)
    #[arg(long)]
    sim: bool,

    /// Seed for simulation providers
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Loop termination policy
    #[arg(long, value_enum, default_value = "single-pass")]
    termination: Termination,

    /// Handling of tickets that match no category
    #[arg(long, value_enum, default_value = "immediate")]
    creation: Creation,

    /// Scan for merges only when no ticket work is left
    #[arg(long)]
    lazy_merge_scan: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = LOG_LEVEL_DEFAULT)]
    log_level: String,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn triage_config(&self) -> TriageConfig {
        let mut config = TriageConfig::default()
            .with_threshold(self.threshold)
            .with_merge_examples(self.merge_examples)
            .with_creation_mode(match self.creation {
                Creation::Immediate => CreationMode::Immediate,
                Creation::Deferred => CreationMode::Deferred,
            })
            .with_termination_mode(match self.termination {
                Termination::SinglePass => TerminationMode::SinglePass,
                Termination::FixedPoint => TerminationMode::FixedPoint,
            });
        if self.lazy_merge_scan {
            config = config.without_eager_merge_scan();
        }
        config
    }

    /// Clear the memory file, then load the ticket table. The reset comes
    /// first so a failed load never leaves a previous run's categories behind.
    fn load_input(&self) -> Result<TicketTable> {
        FileCheckpoint::new(&self.memory)
            .reset_memory()
            .context("failed to reset category memory")?;
        TicketTable::from_path(&self.input)
            .with_context(|| format!("failed to load tickets from {}", self.input.display()))
    }

    fn telemetry_config(&self) -> TelemetryConfig {
        let config = TelemetryConfig::default().with_level(&self.log_level);
        if self.json_logs {
            config.with_json()
        } else {
            config
        }
    }
}

type Providers = (Box<dyn EmbeddingProvider>, Box<dyn CategoryOracle>);

fn sim_providers(seed: u64) -> Providers {
    (
        Box::new(SimEmbeddingProvider::with_seed(seed)),
        Box::new(LlmOracle::new(SimLLMProvider::with_seed(seed))),
    )
}

#[cfg(all(feature = "openai", feature = "embedding-openai"))]
fn remote_providers() -> Result<Providers> {
    use triage_engine::config::{EmbeddingConfig, OracleConfig};
    use triage_engine::embedding::{LazyEmbeddingProvider, OpenAIEmbeddingProvider};
    use triage_engine::llm::OpenRouterProvider;

    let oracle_config = OracleConfig::from_env().context("oracle configuration")?;
    let embedding_config = EmbeddingConfig::from_env().context("embedding configuration")?;

    let dimensions = embedding_config.dimensions;
    let embedder = LazyEmbeddingProvider::new(dimensions, move || {
        Ok(OpenAIEmbeddingProvider::from_config(&embedding_config))
    });
    let oracle = LlmOracle::new(OpenRouterProvider::from_config(&oracle_config));

    Ok((Box::new(embedder), Box::new(oracle)))
}

#[cfg(not(all(feature = "openai", feature = "embedding-openai")))]
fn remote_providers() -> Result<Providers> {
    anyhow::bail!("built without the `openai` and `embedding-openai` features; rerun with --sim")
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.telemetry_config()).context("failed to initialize logging")?;

    let started = Instant::now();

    let table = cli.load_input()?;
    tracing::info!(
        tickets = table.len(),
        text_column = table.text_column(),
        "tickets loaded"
    );

    let (embedder, oracle) = if cli.sim {
        sim_providers(cli.seed)
    } else {
        remote_providers()?
    };

    let mut engine = Categorizer::new(embedder, oracle, cli.triage_config())
        .context("invalid configuration")?;
    let mut checkpoint =
        FileCheckpoint::new(&cli.memory).with_output(&cli.output, table.clone());

    let report = engine
        .run(table.tickets(), &mut checkpoint)
        .await
        .context("categorization run failed")?;

    let elapsed_minutes = started.elapsed().as_secs_f64() / 60.0;
    tracing::info!(
        categories = report.categories.len(),
        threshold = report.threshold,
        iterations = report.iterations,
        output = %cli.output.display(),
        memory = %cli.memory.display(),
        elapsed_minutes = %format!("{elapsed_minutes:.2}"),
        "categorization complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_memory_reset_even_when_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let memory = dir.path().join("category_memory.json");
        std::fs::write(&memory, r#"{"categories": {"Stale": {"examples": ["old"], "embedding": [1.0]}}}"#)
            .unwrap();

        let cli = Cli::parse_from([
            OsString::from("triage"),
            dir.path().join("missing.json").into_os_string(),
            OsString::from("--memory"),
            memory.clone().into_os_string(),
        ]);

        assert!(cli.load_input().is_err());
        assert_eq!(std::fs::read_to_string(&memory).unwrap(), "{}");
    }

    #[test]
    fn test_defaults_build_a_valid_config() {
        let cli = Cli::parse_from(["triage", "tickets.json"]);
        assert!(cli.triage_config().validate().is_ok());
        assert_eq!(cli.seed, 42);
    }
}
