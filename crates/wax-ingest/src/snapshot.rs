//! Store snapshot export
//!
//! Dumps a store's current contents as pretty-printed JSON, sorted by ID so
//! successive exports of the same data diff cleanly. Export is an external
//! convenience over `list()`; it takes no part in ingestion.

use crate::mapper::DumpRecord;
use crate::store::RecordStore;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;
use wax_common::Result;

/// Write every record in the store to `writer` as a JSON array.
pub fn write_snapshot<T, W>(store: &RecordStore<T>, writer: W) -> Result<()>
where
    T: DumpRecord + Serialize,
    W: Write,
{
    let mut records = store.list();
    records.sort_by_key(|r| r.id());
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Write a snapshot to a file path.
pub fn snapshot_to_file<T>(store: &RecordStore<T>, path: &Path) -> Result<()>
where
    T: DumpRecord + Serialize,
{
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_snapshot(store, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), records = store.count(), "snapshot written");
    Ok(())
}
