//! Common error types for the tender management service

use thiserror::Error;

/// Common result type for tender operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the tender workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Estimated cost is zero or negative; derived percentages are undefined
    #[error("Invalid estimate: {0}")]
    InvalidEstimate(String),

    /// Record failed schema validation; field-level messages attached
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// File parsing error (Excel/PDF ingestion)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Template rendering error (missing variable, bad template)
    #[error("Template error: {0}")]
    Template(String),

    /// External tool failure (pdflatex, pandoc)
    #[error("External tool error: {0}")]
    ExternalTool(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
