//! Error types for eventscope-core

use thiserror::Error;

/// Main error type for the eventscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// No column in the detection sample looked like datetime values
    #[error("no datetime column found in {columns} column(s)")]
    NoDateTimeColumn { columns: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV syntax error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown IANA timezone identifier (strict parsing only)
    #[error("invalid timezone identifier: {0}")]
    InvalidTimezone(String),

    /// Pipeline worker died or hung up before finishing
    #[error("worker error: {0}")]
    Worker(String),
}

/// Result type alias for eventscope-core
pub type Result<T> = std::result::Result<T, Error>;
