//! Wax Ingest Library
//!
//! Streaming ingestion of compressed Discogs-style XML catalog dumps into
//! typed in-memory stores.
//!
//! # Pipeline
//!
//! ```text
//! .xml.gz file -> XmlDecoder -> Element -> DumpRecord mapper
//!              -> RecordScanner -> IngestPipeline -> RecordStore
//! ```
//!
//! Decoding is incremental: the gzip envelope is read in bounded chunks and
//! the XML tokenizer never materializes the document, so multi-gigabyte
//! dumps ingest in constant memory. Individual malformed entries are logged
//! and skipped; only stream-level corruption aborts a run.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use wax_ingest::pipeline;
//! use wax_ingest::store::Catalog;
//! use wax_ingest::models::EntityKind;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Arc::new(Catalog::new());
//!     let summary = pipeline::ingest_file(
//!         "discogs_20250101_releases.xml.gz".into(),
//!         EntityKind::Release,
//!         catalog.clone(),
//!         CancellationToken::new(),
//!     )
//!     .await?;
//!     println!("stored {} releases", summary.stored);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decode;
pub mod element;
pub mod mapper;
pub mod models;
pub mod pipeline;
pub mod scanner;
pub mod snapshot;
pub mod store;
