//! `tickler` — forces read repair across every partition of one table.
//!
//! Each partition key is read back at consistency `ALL`, which makes the
//! coordinator compare every replica and write back whatever is missing or
//! stale. A fixed delay after each read keeps the extra load bounded.
//!
//! # Usage
//!
//! ```text
//! tickler <keyspace> <table> <contact_point> <delay_ms>
//! tickler -c tickler.toml shop orders 10.0.0.5 50
//! ```

mod config;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tickler_cql::ScyllaSession;
use tickler_repair::{ConsoleReporter, RepairError, RepairRun};
use tracing::info;

use config::ToolConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "tickler",
    version,
    about = "Force read repair across every partition of a Cassandra or Scylla table"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keyspace holding the table.
    keyspace: String,

    /// Table to repair.
    table: String,

    /// Address of one cluster node, optionally with `:port`.
    contact_point: String,

    /// Pause after each partition, in milliseconds.
    delay: u64,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ToolConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    let connect = config.connect_options(&cli.contact_point)?;
    let options = config.repair_options(Duration::from_millis(cli.delay));
    info!(
        keyspace = %cli.keyspace,
        table = %cli.table,
        contact_point = %connect.known_node(),
        delay_ms = cli.delay,
        on_failure = ?options.on_failure,
        "starting repair"
    );

    let session = ScyllaSession::connect(&connect)
        .await
        .map_err(|source| RepairError::Connection {
            contact_point: cli.contact_point.clone(),
            source,
        })?;

    let mut reporter = ConsoleReporter::with_interval(io::stdout(), config.progress.interval);
    let summary = RepairRun::new(&session, &cli.keyspace, &cli.table, options)
        .execute(&mut reporter)
        .await
        .with_context(|| format!("repair of {}.{} failed", cli.keyspace, cli.table))?;

    if !summary.is_complete() {
        return Err(RepairError::PartitionsFailed {
            count: summary.failed.len(),
        }
        .into());
    }
    Ok(())
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr; stdout carries only the progress output.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
