//! Wax Common Library
//!
//! Shared error handling and logging for the Wax workspace.
//!
//! # Overview
//!
//! This crate provides the plumbing used across all Wax workspace members:
//!
//! - **Error Handling**: the [`WaxError`] type and [`Result`] alias
//! - **Logging**: tracing subscriber configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use wax_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{Result, WaxError};
