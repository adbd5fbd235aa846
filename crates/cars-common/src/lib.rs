//! Cars ETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging bootstrap for the cars ETL
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the `EtlError` type and `Result` alias used
//!   by every workspace member
//! - **Logging**: tracing subscriber setup with console/file targets
//!
//! # Example
//!
//! ```no_run
//! use cars_common::{EtlError, Result};
//!
//! fn read_ledger(path: &str) -> Result<String> {
//!     let content = std::fs::read_to_string(path)?;
//!     Ok(content)
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{EtlError, Result};
