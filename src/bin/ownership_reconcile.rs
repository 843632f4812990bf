//! ownership-reconcile
//!
//! Runs one batch of scraped source records through the reconciliation
//! pipeline and prints a JSON report: the batch summary, plus the audit
//! records and resolved edges when requested.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;

use ownership_reconcile::{
    Clock, FixedClock, InMemoryEdgeSink, ReconcileConfig, ReconcileEngine, SourceRecord,
    SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "ownership-reconcile")]
#[command(about = "Reconcile scraped ownership assertions into resolved edges")]
struct Args {
    /// JSON file holding an array of source records
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// TOML configuration (weights, priorities, scoring, resolver)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Pin "now" to an RFC 3339 instant for reproducible scores
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Also print the resolved edges
    #[arg(long)]
    emit_edges: bool,

    /// Keep and print resolution records for every contested target
    #[arg(long)]
    audit: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReconcileConfig::load(path)?,
        None => ReconcileConfig::default(),
    };
    if args.audit {
        config.resolver.retain_audit = true;
    }

    let raw = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;
    let records: Vec<SourceRecord> = serde_json::from_str(&raw)?;
    tracing::info!(records = records.len(), input = %args.input.display(), "loaded batch");

    let clock: Arc<dyn Clock> = match args.now {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(SystemClock),
    };
    let sink = Arc::new(InMemoryEdgeSink::new());
    let engine = ReconcileEngine::with_clock(&config, sink.clone(), clock);

    let reconciliation = engine.reconcile(&records);
    let summary = engine.commit(&reconciliation)?;

    let mut report = serde_json::json!({ "summary": summary });
    if args.audit {
        report["records"] = serde_json::to_value(&reconciliation.records)?;
    }
    if args.emit_edges {
        report["edges"] = serde_json::to_value(sink.edges()?)?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
