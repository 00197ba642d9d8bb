//! Ingestion pipeline orchestration
//!
//! Drives one scanner against one store for a single file/kind pair and
//! reports a [`RunSummary`]. The async entry points dispatch runtime entity
//! kinds onto blocking workers, one worker per dump file; workers run in
//! parallel with no ordering guarantee between them.

use crate::decode::{DecodeError, DumpDecoder, XmlDecoder};
use crate::mapper::{DumpRecord, MappingError};
use crate::models::EntityKind;
use crate::scanner::RecordScanner;
use crate::store::{Catalog, RecordStore};
use anyhow::Context;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Aggregate result of one ingestion pass.
///
/// For well-formed input, `scanned == stored + errors.len()`. Records
/// committed before a fatal error or cancellation stay committed; there is
/// no rollback.
#[derive(Debug)]
pub struct RunSummary {
    pub kind: EntityKind,
    /// Entity-root elements encountered, valid and malformed alike.
    pub scanned: u64,
    /// Records upserted into the store.
    pub stored: u64,
    /// Per-record mapping failures, in document order.
    pub errors: Vec<MappingError>,
    /// Terminal decode failure, when the run ended abnormally.
    pub decode_error: Option<DecodeError>,
    /// True when the run stopped because the cancellation token fired.
    pub cancelled: bool,
}

impl RunSummary {
    /// True when the stream was fully consumed without a fatal error.
    pub fn completed(&self) -> bool {
        self.decode_error.is_none() && !self.cancelled
    }
}

/// One scanner feeding one store.
pub struct IngestPipeline<'a, T: DumpRecord, R: BufRead> {
    scanner: RecordScanner<T, R>,
    store: &'a RecordStore<T>,
}

impl<'a, T: DumpRecord, R: BufRead> IngestPipeline<'a, T, R> {
    pub fn new(scanner: RecordScanner<T, R>, store: &'a RecordStore<T>) -> Self {
        Self { scanner, store }
    }

    /// Scan to exhaustion, upserting every valid record.
    pub fn run(mut self) -> RunSummary {
        let mut stored = 0u64;
        while self.scanner.scan() {
            self.store.upsert(self.scanner.next());
            stored += 1;
            if stored % 100_000 == 0 {
                debug!(kind = %T::KIND, stored, "ingestion progress");
            }
        }

        let (scanned, errors, fatal) = self.scanner.finish();
        let cancelled = matches!(fatal, Some(DecodeError::Cancelled));
        RunSummary {
            kind: T::KIND,
            scanned,
            stored,
            errors,
            decode_error: fatal.filter(|e| !e.is_cancelled()),
            cancelled,
        }
    }
}

/// Ingest a single dump file of a known record type, synchronously.
///
/// Never fails outright: a file that cannot even be opened comes back as a
/// summary with zero records and the decode error set, the same shape a
/// mid-stream failure produces.
pub fn ingest_path<T: DumpRecord>(
    path: &Path,
    store: &RecordStore<T>,
    cancel: CancellationToken,
) -> RunSummary {
    info!(kind = %T::KIND, path = %path.display(), "starting ingestion");
    let decoder = match DumpDecoder::open_path(path, cancel) {
        Ok(decoder) => decoder,
        Err(e) => {
            return RunSummary {
                kind: T::KIND,
                scanned: 0,
                stored: 0,
                errors: Vec::new(),
                decode_error: Some(e),
                cancelled: false,
            }
        },
    };
    let summary = IngestPipeline::new(RecordScanner::<T, _>::new(decoder), store).run();
    info!(
        kind = %summary.kind,
        scanned = summary.scanned,
        stored = summary.stored,
        skipped = summary.errors.len(),
        "ingestion finished"
    );
    summary
}

/// Ingest one file into the catalog store for the selected kind.
///
/// Decoding runs on a blocking worker; the cancellation token propagates
/// down to the decoder and is observed between tokens.
pub async fn ingest_file(
    path: PathBuf,
    kind: EntityKind,
    catalog: Arc<Catalog>,
    cancel: CancellationToken,
) -> anyhow::Result<RunSummary> {
    tokio::task::spawn_blocking(move || match kind {
        EntityKind::Artist => ingest_path(&path, &catalog.artists, cancel),
        EntityKind::Label => ingest_path(&path, &catalog.labels, cancel),
        EntityKind::Master => ingest_path(&path, &catalog.masters, cancel),
        EntityKind::Release => ingest_path(&path, &catalog.releases, cancel),
    })
    .await
    .context("ingestion worker panicked")
}

/// File name of one dump in a catalog drop, e.g.
/// `discogs_20250101_releases.xml.gz`.
pub fn dump_file_name(date: &str, kind: EntityKind) -> String {
    format!("discogs_{date}_{}.xml.gz", kind.dump_category())
}

/// Ingest a full catalog drop: one worker per entity kind, in parallel.
///
/// Summaries come back in completion order. A missing or corrupt file
/// surfaces in that kind's summary; it does not stop the other workers.
pub async fn ingest_dump(
    dir: &Path,
    date: &str,
    catalog: Arc<Catalog>,
    cancel: CancellationToken,
) -> anyhow::Result<Vec<RunSummary>> {
    let mut workers = JoinSet::new();
    for kind in EntityKind::ALL {
        let path = dir.join(dump_file_name(date, kind));
        workers.spawn(ingest_file(
            path,
            kind,
            Arc::clone(&catalog),
            cancel.clone(),
        ));
    }

    let mut summaries = Vec::with_capacity(EntityKind::ALL.len());
    while let Some(joined) = workers.join_next().await {
        summaries.push(joined.context("ingestion worker panicked")??);
    }
    Ok(summaries)
}

/// Log one line per finished run; errors are called out loudly.
pub fn log_summaries(summaries: &[RunSummary]) {
    for summary in summaries {
        if let Some(ref e) = summary.decode_error {
            tracing::error!(kind = %summary.kind, stored = summary.stored, "run aborted: {e}");
        } else if summary.cancelled {
            tracing::warn!(kind = %summary.kind, stored = summary.stored, "run cancelled");
        } else {
            info!(
                kind = %summary.kind,
                scanned = summary.scanned,
                stored = summary.stored,
                skipped = summary.errors.len(),
                "run complete"
            );
        }
    }
}
