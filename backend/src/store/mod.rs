//! Configuration store access.
//!
//! The pipeline only sees the [`RecordStore`] trait: given a [`RecordKind`],
//! return the matching configuration rows in store order. Two backends:
//!
//! | Backend         | Source                                              |
//! |-----------------|-----------------------------------------------------|
//! | [`SqliteStore`] | `eh_dynamic_grid_config` table in a SQLite database |
//! | [`ExportStore`] | the same table exported as JSON or CSV              |
//!
//! Both apply the same selection: live rows (`is_delete = 0`) with
//! `search_type = 'common'` and a title for direct records, `search_type =
//! 'sql'` for query records.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, Row};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::models::{RawConfigRecord, RecordKind};
use crate::parser::{coerce_bool, ValueExt};

/// Table holding dynamic grid configurations.
pub const GRID_CONFIG_TABLE: &str = "eh_dynamic_grid_config";

const DIRECT_QUERY: &str = "SELECT t.table_title, t.data_source, t.grid \
     FROM eh_dynamic_grid_config t \
     WHERE t.is_delete = 0 AND t.table_title IS NOT NULL AND t.search_type = 'common'";

const QUERY_QUERY: &str = "SELECT t.table_title, t.data_source, t.grid, t.options \
     FROM eh_dynamic_grid_config t \
     WHERE t.is_delete = 0 AND t.search_type = 'sql'";

/// Source of raw configuration records.
pub trait RecordStore: Send + Sync {
    /// Fetch all records of one kind, in store order.
    fn fetch(&self, kind: RecordKind) -> StoreResult<Vec<RawConfigRecord>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Open a store, choosing the backend from the file extension.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<Box<dyn RecordStore>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "db" | "sqlite" | "sqlite3" => Ok(Box::new(SqliteStore::new(path))),
        "json" | "csv" => Ok(Box::new(ExportStore::open(path)?)),
        _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    }
}

// =============================================================================
// SQLite
// =============================================================================

/// Reads configuration rows from a SQLite database.
///
/// A read-only connection is opened per fetch and dropped before returning.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RecordStore for SqliteStore {
    fn fetch(&self, kind: RecordKind) -> StoreResult<Vec<RawConfigRecord>> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let sql = match kind {
            RecordKind::Direct => DIRECT_QUERY,
            RecordKind::Query => QUERY_QUERY,
        };
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map([], |row| record_from_row(kind, row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

fn record_from_row(kind: RecordKind, row: &Row<'_>) -> rusqlite::Result<RawConfigRecord> {
    Ok(RawConfigRecord {
        title: row.get(0)?,
        data_source: row.get(1)?,
        grid: row.get(2)?,
        options: match kind {
            RecordKind::Direct => None,
            RecordKind::Query => row.get(3)?,
        },
    })
}

// =============================================================================
// Exports
// =============================================================================

/// One exported table row.
#[derive(Debug, Clone, Default, PartialEq)]
struct ConfigRow {
    record: RawConfigRecord,
    search_type: Option<String>,
    deleted: bool,
}

impl ConfigRow {
    fn from_map(map: &Map<String, Value>) -> Self {
        let pick = |names: &[&str]| names.iter().find_map(|n| map.string_field(n));

        Self {
            record: RawConfigRecord {
                title: pick(&["table_title", "title"]),
                data_source: pick(&["data_source", "dataSource"]),
                grid: pick(&["grid"]),
                options: pick(&["options"]),
            },
            search_type: pick(&["search_type", "searchType"]),
            // exports without the column only hold live rows
            deleted: ["is_delete", "isDelete"]
                .iter()
                .find_map(|n| map.field(n))
                .and_then(coerce_bool)
                .unwrap_or(false),
        }
    }

    fn matches(&self, kind: RecordKind) -> bool {
        if self.deleted || self.search_type.as_deref() != Some(kind.search_type()) {
            return false;
        }
        match kind {
            RecordKind::Direct => self.record.title.is_some(),
            RecordKind::Query => true,
        }
    }
}

/// Reads configuration rows from a JSON or CSV export of the table.
///
/// JSON exports are an array of row objects, or an object wrapping that
/// array under `RECORDS`. CSV exports need a header row; empty cells are
/// treated as NULL.
#[derive(Debug, Clone, Default)]
pub struct ExportStore {
    source: String,
    rows: Vec<ConfigRow>,
}

impl ExportStore {
    /// Load an export file (`.json` or `.csv`).
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let is_csv = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        let mut store = if is_csv {
            Self::from_csv_bytes(&bytes)?
        } else {
            Self::from_json_str(&decode_content(&bytes, &detect_encoding(&bytes))?)?
        };
        store.source = path.display().to_string();
        Ok(store)
    }

    pub fn from_json_str(content: &str) -> StoreResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Object(mut wrapper) => match wrapper.remove("RECORDS") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok(Self {
            source: "json".to_string(),
            rows: rows
                .iter()
                .filter_map(Value::as_object)
                .map(ConfigRow::from_map)
                .collect(),
        })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> StoreResult<Self> {
        let content = decode_content(bytes, &detect_encoding(bytes))?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let map: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| {
                    let value = if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    };
                    (header.clone(), value)
                })
                .collect();
            rows.push(ConfigRow::from_map(&map));
        }

        Ok(Self {
            source: "csv".to_string(),
            rows,
        })
    }
}

impl RecordStore for ExportStore {
    fn fetch(&self, kind: RecordKind) -> StoreResult<Vec<RawConfigRecord>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| row.matches(kind))
            .map(|row| row.record.clone())
            .collect())
    }

    fn describe(&self) -> String {
        format!("export:{}", self.source)
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Detect the encoding of an export using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode export bytes, falling back to lossy UTF-8 for unknown labels.
pub fn decode_content(bytes: &[u8], encoding: &str) -> StoreResult<String> {
    if encoding == "utf-8" {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        return String::from_utf8(bytes.to_vec())
            .or_else(|_| Ok(String::from_utf8_lossy(bytes).to_string()));
    }

    match encoding_rs::Encoding::for_label(encoding.as_bytes()) {
        Some(enc) => {
            let (decoded, _, had_errors) = enc.decode(bytes);
            if had_errors && enc != encoding_rs::UTF_8 {
                return Err(StoreError::Encoding(format!(
                    "invalid {} byte sequence",
                    enc.name()
                )));
            }
            Ok(decoded.to_string())
        }
        None => Ok(String::from_utf8_lossy(bytes).to_string()),
    }
}
