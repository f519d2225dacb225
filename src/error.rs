use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ConsolidateError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads, consolidates, validates, or emits spreadsheet data.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Errors bubbled up from the SQLite staging store.
    #[error("staging store error: {0}")]
    Staging(#[from] rusqlite::Error),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a custom column template cannot be used.
    #[error("invalid column template: {0}")]
    InvalidTemplate(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised in strict mode when the integrity validation finds
    /// discrepancies between the source tables and the consolidated output.
    #[error(
        "validation failed: {mismatched_tables} table(s) with row-count mismatches \
         ({difference} row(s) difference overall)"
    )]
    ValidationFailed {
        mismatched_tables: usize,
        difference: usize,
    },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
