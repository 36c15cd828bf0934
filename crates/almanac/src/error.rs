//! Error types for the Almanac library.
//!
//! Only the I/O surfaces (record files, registry configuration, output
//! writers) produce errors. The extraction parsers never fail on content.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Almanac operations.
#[derive(Debug, Error)]
pub enum AlmanacError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no records to extract.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid field registry or engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A record field has no registered parser (strict mode only).
    #[error("No parser registered for field '{field}' in record '{record}'")]
    UnknownField { record: String, field: String },
}

impl AlmanacError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AlmanacError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for Almanac operations.
pub type Result<T> = std::result::Result<T, AlmanacError>;
