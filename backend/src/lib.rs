//! # Gridscribe - grid configuration report generator
//!
//! Gridscribe reads the grid configurations of a data-driven admin
//! application, resolves the service endpoint each grid calls, enriches the
//! request descriptor with column and sort settings, and writes everything
//! into one spreadsheet for review.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Store    │────▶│  Transform  │────▶│   Report    │────▶│    .xlsx    │
//! │ (sqlite/csv)│     │ (endpoint + │     │ (sheet per  │     │  (atomic)   │
//! │             │     │    grid)    │     │    kind)    │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                ▲
//!                     ┌─────────────┐            │
//!                     │ Collections │────────────┘
//!                     │  (*.json)   │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gridscribe::{run_report_with_config, ReportConfig};
//!
//! let summary = run_report_with_config(&ReportConfig::from_env())?;
//! println!("Wrote {} rows to {}", summary.total_rows(), summary.output.display());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Raw and normalized records
//! - [`parser`] - Embedded JSON-text parsing
//! - [`transform`] - Endpoint resolution, grid reduction, pipeline
//! - [`store`] - Configuration sources (SQLite, JSON/CSV exports)
//! - [`report`] - Spreadsheet output
//! - [`collection`] - Request-collection ingestion
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP trigger and log stream

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Sources
pub mod collection;
pub mod store;

// Output
pub mod report;

pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CollectionError, ParseError, PipelineError, PipelineResult, ReportError, ServerError,
    StoreError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{NormalizedColumn, NormalizedRecord, RawConfigRecord, RecordKind};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    endpoint_identifier, extract_query_string, normalize_grid, resolve_endpoint,
    transform_direct, transform_query, transform_record, transform_records, GridNormalization,
    QueryEndpoint,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    build_report, run_collection_report, run_report, run_report_with_config, ReportSummary,
    SheetSummary,
};

// =============================================================================
// Re-exports - Sources and output
// =============================================================================

pub use collection::{collect_dir, CollectionRequest, DEFAULT_URL_PATTERN};
pub use config::ReportConfig;
pub use report::{sheet_from_records, write_report, ReportRow, ReportSheet};
pub use store::{open_store, ExportStore, RecordStore, SqliteStore};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ReportRequest, ReportResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
