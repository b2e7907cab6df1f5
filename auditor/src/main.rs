//! Auditor service binary.
//!
//! Wires configuration, telemetry, and the audit pipeline together behind a
//! small CLI: `run` streams and persists post events, `init-db` creates the
//! schema, and `sync-rules` aligns the deployed stream rules and the stored
//! author directory with the configured tracked accounts.

use clap::{Parser, Subcommand};

use audit_telemetry::metrics::init_metrics;
use audit_telemetry::tracing::init_tracing;

mod config;
mod core;

#[derive(Parser)]
#[command(name = "auditor")]
#[command(about = "Streams tracked accounts' posts into a Postgres audit log")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the audit pipeline.
    Run,
    /// Create the audit schema in the configured database.
    InitDb,
    /// Replace the deployed stream rules and refresh the author directory.
    SyncRules,
    /// Show the rules currently deployed on the stream.
    ShowRules,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_auditor_config()?;

    init_tracing(env!("CARGO_BIN_NAME"));

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli, config))
}

async fn async_main(cli: Cli, config: audit_config::shared::AuditorConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Run => {
            init_metrics()?;
            core::run_pipeline(config).await
        }
        Command::InitDb => core::init_db(config).await,
        Command::SyncRules => core::sync_rules(config).await,
        Command::ShowRules => core::show_rules(config).await,
    }
}
