//! Entry point for the Vitals Bridge service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vitals_client::{CouchSource, DryRunSink, TrackerSink};
use vitals_core::{Category, DeliverySink};
use vitals_ledger::{FileLedger, SyncLedger};
use vitals_node::{BridgeConfig, BridgeOptions, BridgeStatus, Phase, SyncBridge};

#[derive(Debug, Parser)]
#[command(
    name = "vitals-bridge",
    about = "Mirrors community health report forms into a tracker API",
    version
)]
struct Cli {
    /// Path of the TOML configuration file
    #[arg(long, short, default_value = "vitals-bridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize, backfill every category, then tail the live feed
    Run {
        /// Log transformed events instead of delivering them
        #[arg(long)]
        dry_run: bool,
    },
    /// Bounded historical pass, then exit
    Backfill {
        /// Form name to backfill; all known categories when omitted
        #[arg(long)]
        category: Option<String>,
        /// Maximum documents to fetch per category
        #[arg(long)]
        limit: Option<usize>,
        /// Log transformed events instead of delivering them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print ledger statistics and exit
    Status,
    /// Clear delivered-document entries, forcing a full re-sync
    Reset {
        /// Confirm clearing the ledger
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(&cli.config)?;

    match cli.command {
        Command::Run { dry_run } => {
            let bridge = build_bridge(&config, dry_run).await?;
            bridge.run(shutdown_signal()).await?;
        }
        Command::Backfill {
            category,
            limit,
            dry_run,
        } => {
            let bridge = build_bridge(&config, dry_run).await?;
            bridge.initialize().await?;

            let categories = match category {
                Some(form) => vec![
                    Category::from_form(&form).with_context(|| format!("unknown category: {form}"))?,
                ],
                None => Category::ALL.to_vec(),
            };
            let limit = limit.unwrap_or(config.backfill.limit);

            for category in categories {
                let report = bridge.backfill(category, limit).await?;
                println!("{category}: {report}");
            }
        }
        Command::Status => {
            let ledger = FileLedger::open(&config.ledger_path).await?;
            let stats = ledger.stats().await?;
            let status = BridgeStatus {
                phase: Phase::Idle,
                total_synced: stats.total_synced,
                last_sync_time: stats.last_sync_time,
                cursor: stats.cursor,
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Reset { yes } => {
            anyhow::ensure!(yes, "refusing to clear the ledger without --yes");
            let ledger = FileLedger::open(&config.ledger_path).await?;
            ledger.clear_entries().await?;
            println!("ledger entries cleared");
        }
    }

    Ok(())
}

/// Wire the collaborators described by the configuration.
async fn build_bridge(config: &BridgeConfig, dry_run: bool) -> anyhow::Result<SyncBridge> {
    let source = Arc::new(CouchSource::new(config.source.clone())?);
    let sink: Arc<dyn DeliverySink> = if dry_run {
        Arc::new(DryRunSink::new())
    } else {
        Arc::new(TrackerSink::new(config.sink.clone())?)
    };
    let ledger = Arc::new(FileLedger::open(&config.ledger_path).await?);

    Ok(SyncBridge::new(
        source,
        sink,
        ledger,
        config.routing.router_context(),
        BridgeOptions {
            pacing: config.backfill.pacing(),
            backfill_limit: config.backfill.limit,
        },
    ))
}

/// Fires once on SIGINT or SIGTERM.
fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received, finishing in-flight work");
        let _ = tx.send(true);
    });
    rx
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
