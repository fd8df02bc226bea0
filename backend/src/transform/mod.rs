//! Transformation module.
//!
//! This module turns raw grid configuration rows into report records:
//! - Endpoint: URL resolution for direct and query records
//! - Grid: column/sort reduction of grid layouts
//! - Records: per-record and per-batch normalization
//! - Pipeline: store → transform → spreadsheet jobs

pub mod endpoint;
pub mod grid;
pub mod pipeline;
pub mod records;

pub use endpoint::{endpoint_identifier, extract_query_string, resolve_endpoint, QueryEndpoint};
pub use grid::{normalize_grid, GridNormalization};
pub use pipeline::*;
pub use records::{transform_direct, transform_query, transform_record, transform_records};
