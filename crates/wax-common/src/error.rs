//! Error types shared across the Wax workspace

use thiserror::Error;

/// Result type alias for Wax operations
pub type Result<T> = std::result::Result<T, WaxError>;

/// Main error type for cross-cutting concerns.
///
/// Ingestion-specific failures (decode and mapping errors) live in the
/// ingest crate; this type covers configuration, serialization, and plain IO.
#[derive(Error, Debug)]
pub enum WaxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
