//! Wax Ingest - catalog dump ingestion tool

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wax_common::logging::{init_logging, LogConfig, LogLevel};
use wax_ingest::config::IngestConfig;
use wax_ingest::models::EntityKind;
use wax_ingest::pipeline::{self, RunSummary};
use wax_ingest::snapshot;
use wax_ingest::store::Catalog;

#[derive(Parser, Debug)]
#[command(name = "wax-ingest")]
#[command(author, version, about = "Wax catalog dump ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Ingest a single dump file of one entity kind
    File {
        /// Path to the .xml.gz (or plain .xml) dump
        path: PathBuf,

        /// Entity kind: artist, label, master, or release
        kind: String,

        /// Write the ingested store as JSON after the run
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Ingest a full catalog drop (all four kinds, in parallel)
    Dump {
        /// Directory holding the dump files (default: WAX_DATA_DIR or ./data)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Drop date, YYYYMMDD (default: WAX_DUMP_DATE)
        #[arg(short = 't', long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    log_config.file_prefix = "wax-ingest".to_string();
    init_logging(&log_config)?;

    let catalog = Arc::new(Catalog::new());
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match cli.command {
        Command::File {
            path,
            kind,
            snapshot,
        } => {
            let kind: EntityKind = kind.parse()?;
            let summary =
                pipeline::ingest_file(path, kind, Arc::clone(&catalog), cancel).await?;
            report(&summary)?;
            if let Some(snapshot_path) = snapshot {
                write_snapshot(&catalog, kind, &snapshot_path)?;
            }
        },
        Command::Dump { dir, date } => {
            let config = IngestConfig::from_env()?;
            let dir = dir.unwrap_or(config.data_dir);
            let date = date.unwrap_or(config.dump_date);
            info!(dir = %dir.display(), date = %date, "ingesting full catalog drop");

            let summaries =
                pipeline::ingest_dump(&dir, &date, Arc::clone(&catalog), cancel).await?;
            pipeline::log_summaries(&summaries);
            info!(total = catalog.total(), "catalog loaded");
            if let Some(failed) = summaries.iter().find(|s| s.decode_error.is_some()) {
                anyhow::bail!(
                    "{} ingestion failed: {}",
                    failed.kind,
                    failed
                        .decode_error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default()
                );
            }
        },
    }

    info!("Ingestion complete");
    Ok(())
}

fn report(summary: &RunSummary) -> Result<()> {
    for error in &summary.errors {
        warn!("skipped: {error}");
    }
    if summary.cancelled {
        warn!(
            kind = %summary.kind,
            stored = summary.stored,
            "run cancelled; keeping records committed so far"
        );
    }
    if let Some(ref e) = summary.decode_error {
        anyhow::bail!("{} ingestion failed: {e}", summary.kind);
    }
    Ok(())
}

fn write_snapshot(catalog: &Catalog, kind: EntityKind, path: &std::path::Path) -> Result<()> {
    match kind {
        EntityKind::Artist => snapshot::snapshot_to_file(&catalog.artists, path)?,
        EntityKind::Label => snapshot::snapshot_to_file(&catalog.labels, path)?,
        EntityKind::Master => snapshot::snapshot_to_file(&catalog.masters, path)?,
        EntityKind::Release => snapshot::snapshot_to_file(&catalog.releases, path)?,
    }
    Ok(())
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling ingestion");
            cancel.cancel();
        }
    });
}
