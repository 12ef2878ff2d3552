//! Domain-level error taxonomy for SRLP.

use std::path::PathBuf;

/// SRLP domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SrlpError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("refinement trace for scenario '{0}' is empty")]
    EmptyTrace(String),

    #[error("record table is empty")]
    EmptyTable,

    #[error("distribution error: {0}")]
    Distribution(String),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SRLP domain operations.
pub type Result<T> = std::result::Result<T, SrlpError>;
