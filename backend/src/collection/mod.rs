//! Request-collection ingestion.
//!
//! Reads API-testing tool collection exports (`*.postman_collection.json`),
//! flattens their nested folders and keeps the requests whose URL matches a
//! pattern, one sheet per collection file.
//!
//! ```text
//! item ─┬─ folder ─┬─ request  ✓ url matches  → row
//!       │          └─ folder ── request       → row
//!       └─ request ✗ url does not match       → skipped
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CollectionError, CollectionResult};
use crate::parser::ValueExt;
use crate::report::{ReportRow, ReportSheet};

/// Default URL filter: list-style endpoints (`...!selectXxx.m`).
pub const DEFAULT_URL_PATTERN: &str = r"!select.*\.m$";

/// Base-URL variable stripped from request URLs.
const URL_PLACEHOLDER: &str = "{{url}}/";

/// One request extracted from a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub name: String,
    pub url: String,
    /// Form fields with non-empty values, in collection order.
    pub form_data: Map<String, Value>,
}

impl CollectionRequest {
    /// URL without the base-URL variable.
    pub fn display_url(&self) -> String {
        self.url.replace(URL_PLACEHOLDER, "")
    }

    /// Form data as indented JSON.
    pub fn display_form_data(&self) -> String {
        serde_json::to_string_pretty(&self.form_data)
            .map(|s| s.replace("\\\"", "\""))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

/// Compile a URL filter.
pub fn url_pattern(pattern: &str) -> CollectionResult<Regex> {
    Ok(Regex::new(pattern)?)
}

/// Walk `items` depth-first, collecting requests whose URL matches.
pub fn flatten_items(items: &Value, pattern: &Regex) -> Vec<CollectionRequest> {
    let mut out = Vec::new();
    collect_items(items, pattern, &mut out);
    out
}

fn collect_items(items: &Value, pattern: &Regex, out: &mut Vec<CollectionRequest>) {
    let Some(items) = items.as_array() else {
        return;
    };

    for item in items {
        if let Some(children) = item.field("item") {
            collect_items(children, pattern, out);
            continue;
        }

        let url = request_url(item);
        if pattern.is_match(&url) {
            out.push(CollectionRequest {
                name: item.string_field("name").unwrap_or_default(),
                url,
                form_data: form_data(item),
            });
        }
    }
}

/// `request.url` as text; URL objects contribute their `raw` form.
fn request_url(item: &Value) -> String {
    let Some(url) = item.field("request").and_then(|r| r.field("url")) else {
        return String::new();
    };
    match url {
        Value::String(s) => s.clone(),
        Value::Object(_) => url.string_field("raw").unwrap_or_default(),
        _ => String::new(),
    }
}

fn form_data(item: &Value) -> Map<String, Value> {
    let fields = item
        .field("request")
        .and_then(|r| r.field("body"))
        .and_then(|b| b.field("formdata"))
        .and_then(Value::as_array);

    let mut map = Map::new();
    for field in fields.into_iter().flatten() {
        let key = field.string_field("key").unwrap_or_default();
        let value = field.string_field("value").unwrap_or_default();
        if !value.is_empty() {
            map.insert(key, Value::String(value));
        }
    }
    map
}

/// Sheet name from a collection file name.
///
/// `V5.2-Production.postman_collection.json` → `Production`: the segment
/// between the first and second `-`, cut at the first `.`. Names without a
/// `-` fall back to the file stem.
pub fn sheet_name_from_file(file_name: &str) -> String {
    match file_name.split('-').nth(1) {
        Some(segment) => segment.split('.').next().unwrap_or(segment).to_string(),
        None => Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string(),
    }
}

/// Build the report sheet for one parsed collection.
pub fn collection_sheet(title: impl Into<String>, root: &Value, pattern: &Regex) -> ReportSheet {
    let empty = Value::Null;
    let items = root.field("item").unwrap_or(&empty);

    let rows = flatten_items(items, pattern)
        .into_iter()
        .enumerate()
        .map(|(i, request)| ReportRow {
            index: i + 1,
            url: Some(request.display_url()),
            form_data: Some(request.display_form_data()),
            name: Some(request.name),
            grid: None,
        })
        .collect();

    ReportSheet {
        title: title.into(),
        with_grid: false,
        rows,
    }
}

/// Read one collection file into a sheet.
pub fn read_collection(path: &Path, pattern: &Regex) -> CollectionResult<ReportSheet> {
    let content = fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content).map_err(|source| CollectionError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok(collection_sheet(sheet_name_from_file(file_name), &root, pattern))
}

/// All `*.json` files directly under `dir`, sorted by name.
pub fn collection_files(dir: &Path) -> CollectionResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CollectionError::NotADirectory(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Read every collection in `dir`, one sheet per file.
///
/// Any unreadable collection fails the whole run.
pub fn collect_dir(dir: &Path, pattern: &Regex) -> CollectionResult<Vec<ReportSheet>> {
    collection_files(dir)?
        .iter()
        .map(|path| read_collection(path, pattern))
        .collect()
}
