//! Error types for the grid report pipeline.
//!
//! One error enum per layer, converted upward with `From` so `?` works
//! across boundaries:
//!
//! - [`ParseError`] - embedded JSON text that cannot be decoded
//! - [`TransformError`] - a record that failed normalization
//! - [`StoreError`] - configuration store access
//! - [`ReportError`] - spreadsheet rendering and writing
//! - [`CollectionError`] - request-collection ingestion
//! - [`PipelineError`] - top-level job errors
//! - [`ServerError`] - HTTP trigger errors
//!
//! A missing key is never an error: absent input yields absent output.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::RecordKind;

// =============================================================================
// Parse Errors
// =============================================================================

/// A JSON-text field that is present but cannot be used.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Non-empty text that is not valid JSON.
    #[error("Malformed JSON in '{field}': {source}")]
    Malformed {
        field: String,
        source: serde_json::Error,
    },

    /// Valid JSON with a shape the field can never have.
    #[error("Field '{field}' must hold a JSON {expected}")]
    UnexpectedShape { field: String, expected: &'static str },
}

impl ParseError {
    /// Name of the field that failed to parse.
    pub fn field(&self) -> &str {
        match self {
            ParseError::Malformed { field, .. } => field,
            ParseError::UnexpectedShape { field, .. } => field,
        }
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while normalizing a batch of records.
#[derive(Debug, Error)]
pub enum TransformError {
    /// One record carried malformed configuration.
    #[error("{kind} record #{index} ({title}): {source}")]
    Record {
        kind: RecordKind,
        /// 1-based position in the batch.
        index: usize,
        title: String,
        source: ParseError,
    },
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// Could not decode the export file.
    #[error("Cannot decode export: {0}")]
    Encoding(String),

    /// The path does not name a known store format.
    #[error("Unsupported store format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while rendering or writing the spreadsheet.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Report IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The finished document could not be moved into place.
    #[error("Cannot persist report to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Collection Errors
// =============================================================================

/// Errors while reading request-collection exports.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("Collection IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection file is not valid JSON.
    #[error("Invalid collection {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level job errors.
///
/// Returned by [`crate::transform::pipeline::run_report`] and
/// [`crate::transform::pipeline::run_collection_report`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing embedded JSON.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
