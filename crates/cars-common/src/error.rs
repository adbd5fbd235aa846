//! Error types for the cars ETL pipeline

use thiserror::Error;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Main error type for the cars ETL pipeline
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Schema mismatch in {file}: expected {expected} columns, got {actual}")]
    Schema {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Ledger error: {0}")]
    Ledger(String),
}
