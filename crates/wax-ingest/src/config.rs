//! Ingestion configuration
//!
//! Defaults for where dump files live and how they are read. CLI flags
//! override environment variables, which override the built-in defaults.

use std::path::PathBuf;
use wax_common::{Result, WaxError};

/// Environment-backed ingestion defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Directory holding the catalog dump files.
    pub data_dir: PathBuf,
    /// Drop date embedded in the dump file names, `YYYYMMDD`.
    pub dump_date: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            dump_date: "20250101".to_string(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `WAX_DATA_DIR`, `WAX_DUMP_DATE`. Unset
    /// variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("WAX_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(date) = std::env::var("WAX_DUMP_DATE") {
            if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
                return Err(WaxError::Config(format!(
                    "WAX_DUMP_DATE must be YYYYMMDD, got `{date}`"
                )));
            }
            config.dump_date = date;
        }

        Ok(config)
    }
}
