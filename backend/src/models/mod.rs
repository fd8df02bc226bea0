//! Domain models for the grid report pipeline.
//!
//! - [`RecordKind`] - direct-invocation vs. query-based configuration records
//! - [`RawConfigRecord`] - one row read from the configuration store
//! - [`NormalizedColumn`] - reduced column spec (label dropped, excluded columns filtered)
//! - [`NormalizedRecord`] - output unit handed to the report writer

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Record Kind
// =============================================================================

/// The two shapes of dynamic grid configuration.
///
/// Both share grid normalization but resolve their endpoint differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Backed by a component method call (`bean!method.m`).
    Direct,
    /// Backed by a raw query carried in the record options.
    Query,
}

impl RecordKind {
    /// Both kinds, in report sheet order.
    pub const ALL: [RecordKind; 2] = [RecordKind::Direct, RecordKind::Query];

    /// Value of the `search_type` column selecting this kind in the store.
    pub fn search_type(&self) -> &'static str {
        match self {
            Self::Direct => "common",
            Self::Query => "sql",
        }
    }

    /// Title of the report sheet listing records of this kind.
    pub fn sheet_title(&self) -> &'static str {
        match self {
            Self::Direct => "Grid Requests",
            Self::Query => "Grid SQL",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Query => write!(f, "query"),
        }
    }
}

// =============================================================================
// Raw Record
// =============================================================================

/// One configuration row as read from the store.
///
/// Every field may be missing; the JSON-text fields are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfigRecord {
    #[serde(default, rename = "table_title", alias = "title")]
    pub title: Option<String>,

    #[serde(default, rename = "data_source", alias = "dataSource")]
    pub data_source: Option<String>,

    #[serde(default)]
    pub grid: Option<String>,

    #[serde(default)]
    pub options: Option<String>,
}

impl RawConfigRecord {
    pub fn new(
        title: impl Into<String>,
        data_source: impl Into<String>,
        grid: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            data_source: Some(data_source.into()),
            grid: Some(grid.into()),
            options: None,
        }
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Title for diagnostics.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }
}

// =============================================================================
// Normalized Output
// =============================================================================

/// A column spec reduced to its name and optional reference metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_entity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,
}

impl NormalizedColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A configuration record after endpoint resolution and grid normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub kind: RecordKind,

    pub title: Option<String>,

    /// Derived endpoint identifier; unset when the record names no endpoint.
    pub url: Option<String>,

    /// Enriched data-source descriptor as JSON text.
    pub data_source: Option<String>,

    /// Reduced grid (`columns` + `defaultSort`) as JSON text.
    pub grid: Option<String>,
}

impl NormalizedRecord {
    /// A record that skipped normalization, carried through verbatim.
    pub fn passthrough(kind: RecordKind, raw: RawConfigRecord) -> Self {
        Self {
            kind,
            title: raw.title,
            url: None,
            data_source: raw.data_source,
            grid: raw.grid,
        }
    }
}
