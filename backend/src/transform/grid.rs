//! Grid descriptor normalization.
//!
//! Reduces a grid configuration to the parts the report cares about:
//!
//! ```text
//! grid                                   reduced grid
//! ┌──────────────────────────────┐       ┌─────────────────────────────┐
//! │ columns: [                   │       │ columns: [                  │
//! │   {prop:id,   label:ID}      │  →    │   {name:id}                 │
//! │   {prop:name, pass:true}     │       │ ]                           │
//! │ ]                            │       │ defaultSort: {prop:id, ...} │
//! │ defaultSort: {prop:id, ...}  │       └─────────────────────────────┘
//! │ height, toolbar, ...         │        + sidx/sord for the descriptor
//! └──────────────────────────────┘
//! ```
//!
//! The normalized columns and sort fields are merged back into the
//! data-source descriptor by [`GridNormalization::merge_into`].

use serde_json::{Map, Value};

use crate::error::ParseResult;
use crate::models::NormalizedColumn;
use crate::parser::{parse_json_object, ValueExt};

/// Outcome of normalizing one grid descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridNormalization {
    /// Reduced grid holding only `columns` and `defaultSort`.
    pub grid: Map<String, Value>,

    /// Filtered columns; `None` when the grid declares no column list.
    pub columns: Option<Vec<NormalizedColumn>>,

    /// Sort field, from `defaultSort.prop`.
    pub sidx: Option<String>,

    /// Sort direction, from `defaultSort.order`.
    pub sord: Option<String>,
}

impl GridNormalization {
    /// Write `columns`, `sidx` and `sord` into a data-source descriptor.
    ///
    /// Only fields derived from the grid are written; nothing is removed.
    pub fn merge_into(&self, descriptor: &mut Map<String, Value>) {
        if let Some(ref columns) = self.columns {
            descriptor.insert("columns".to_string(), columns_value(columns));
        }
        if let Some(ref sidx) = self.sidx {
            descriptor.insert("sidx".to_string(), Value::String(sidx.clone()));
        }
        if let Some(ref sord) = self.sord {
            descriptor.insert("sord".to_string(), Value::String(sord.clone()));
        }
    }

    /// Reduced grid as compact JSON text.
    pub fn grid_json(&self) -> String {
        Value::Object(self.grid.clone()).to_string()
    }
}

/// Normalize grid JSON text.
///
/// Missing or empty text yields an empty normalization. Malformed text is an
/// error; missing keys inside the grid are not.
pub fn normalize_grid(grid_text: Option<&str>) -> ParseResult<GridNormalization> {
    let mut result = GridNormalization::default();
    let grid = match parse_json_object("grid", grid_text)? {
        Some(grid) => grid,
        None => return Ok(result),
    };

    if let Some(Value::Array(entries)) = grid.embedded_field("columns")? {
        let columns = normalize_columns(&entries);
        result
            .grid
            .insert("columns".to_string(), columns_value(&columns));
        result.columns = Some(columns);
    }

    if let Some(Value::Object(sort)) = grid.embedded_field("defaultSort")? {
        result.sidx = sort.string_field("prop");
        result.sord = sort.string_field("order");
        result
            .grid
            .insert("defaultSort".to_string(), Value::Object(sort));
    }

    Ok(result)
}

/// Filter and reduce column specs, keeping source order.
///
/// Entries flagged `pass` and entries that are not objects are dropped.
pub fn normalize_columns(entries: &[Value]) -> Vec<NormalizedColumn> {
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter(|spec| !spec.bool_field("pass").unwrap_or(false))
        .map(normalize_column)
        .collect()
}

fn normalize_column(spec: &Map<String, Value>) -> NormalizedColumn {
    NormalizedColumn {
        // `name` is what this function emits, so re-normalizing is a no-op
        name: spec.string_field("prop").or_else(|| spec.string_field("name")),
        ref_entity: non_empty(spec.string_field("refEntity")),
        ref_name: non_empty(spec.string_field("refName")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn columns_value(columns: &[NormalizedColumn]) -> Value {
    Value::Array(columns.iter().map(column_value).collect())
}

fn column_value(column: &NormalizedColumn) -> Value {
    let mut obj = Map::new();
    if let Some(ref name) = column.name {
        obj.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(ref entity) = column.ref_entity {
        obj.insert("refEntity".to_string(), Value::String(entity.clone()));
    }
    if let Some(ref name) = column.ref_name {
        obj.insert("refName".to_string(), Value::String(name.clone()));
    }
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(columns: &[NormalizedColumn]) -> Vec<&str> {
        columns.iter().filter_map(|c| c.name.as_deref()).collect()
    }

    #[test]
    fn test_empty_grid() {
        let result = normalize_grid(None).unwrap();
        assert!(result.grid.is_empty());
        assert!(result.columns.is_none());
        assert_eq!(result.grid_json(), "{}");

        let result = normalize_grid(Some("")).unwrap();
        assert_eq!(result, GridNormalization::default());
    }

    #[test]
    fn test_passed_columns_removed_in_order() {
        let grid = json!({
            "columns": [
                { "prop": "a", "label": "A" },
                { "prop": "b", "label": "B", "pass": true },
                { "prop": "c", "label": "C", "pass": false },
                { "prop": "d", "label": "D", "pass": "true" },
                { "prop": "e", "label": "E" }
            ]
        })
        .to_string();

        let result = normalize_grid(Some(&grid)).unwrap();
        let columns = result.columns.unwrap();
        assert_eq!(names(&columns), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_numeric_pass_flag() {
        let grid = json!({
            "columns": [
                { "prop": "a", "pass": 1 },
                { "prop": "b", "pass": 2 },
                { "prop": "c", "pass": "Y" }
            ]
        })
        .to_string();

        let columns = normalize_grid(Some(&grid)).unwrap().columns.unwrap();
        assert_eq!(names(&columns), vec!["b"]);
    }

    #[test]
    fn test_label_dropped_and_refs_kept() {
        let grid = json!({
            "columns": [
                { "prop": "customer", "label": "Customer", "refEntity": "Customer", "refName": "name" },
                { "prop": "status", "label": "Status", "refEntity": "", "refName": null }
            ]
        })
        .to_string();

        let result = normalize_grid(Some(&grid)).unwrap();
        assert_eq!(
            Value::Object(result.grid),
            json!({
                "columns": [
                    { "name": "customer", "refEntity": "Customer", "refName": "name" },
                    { "name": "status" }
                ]
            })
        );
    }

    #[test]
    fn test_sort_prop_without_order() {
        let grid = r#"{"defaultSort":{"prop":"id"}}"#;
        let result = normalize_grid(Some(grid)).unwrap();

        assert_eq!(result.sidx.as_deref(), Some("id"));
        assert_eq!(result.sord, None);
        assert!(result.columns.is_none());

        let mut descriptor = Map::new();
        result.merge_into(&mut descriptor);
        assert_eq!(Value::Object(descriptor), json!({ "sidx": "id" }));
    }

    #[test]
    fn test_sort_order_without_prop() {
        let grid = r#"{"defaultSort":{"order":"desc"}}"#;
        let result = normalize_grid(Some(grid)).unwrap();

        assert_eq!(result.sidx, None);
        assert_eq!(result.sord.as_deref(), Some("desc"));
        assert_eq!(result.grid["defaultSort"], json!({ "order": "desc" }));
    }

    #[test]
    fn test_embedded_text_columns_and_sort() {
        let grid = json!({
            "columns": r#"[{"prop":"id","label":"ID"}]"#,
            "defaultSort": r#"{"prop":"id","order":"asc"}"#
        })
        .to_string();

        let result = normalize_grid(Some(&grid)).unwrap();
        assert_eq!(names(result.columns.as_ref().unwrap()), vec!["id"]);
        assert_eq!(result.sidx.as_deref(), Some("id"));
        assert_eq!(result.sord.as_deref(), Some("asc"));
    }

    #[test]
    fn test_extra_grid_keys_dropped() {
        let grid = r#"{"height":400,"toolbar":["add"],"columns":[],"stripe":true}"#;
        let result = normalize_grid(Some(grid)).unwrap();

        assert_eq!(result.grid_json(), r#"{"columns":[]}"#);
        assert_eq!(result.columns, Some(vec![]));
    }

    #[test]
    fn test_merge_overwrites_raw_columns() {
        let grid = r#"{"columns":[{"prop":"id","label":"ID"}]}"#;
        let result = normalize_grid(Some(grid)).unwrap();

        let mut descriptor = json!({
            "bean": "orderSvc",
            "columns": [{ "prop": "raw", "label": "Raw" }]
        })
        .as_object()
        .cloned()
        .unwrap();
        result.merge_into(&mut descriptor);

        assert_eq!(descriptor["columns"], json!([{ "name": "id" }]));
        // existing keys keep their position
        assert_eq!(descriptor.keys().collect::<Vec<_>>(), vec!["bean", "columns"]);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let grid = json!({
            "columns": [
                { "prop": "id", "label": "ID" },
                { "prop": "owner", "label": "Owner", "refEntity": "User", "refName": "login" }
            ],
            "defaultSort": { "prop": "id", "order": "asc" }
        })
        .to_string();

        let once = normalize_grid(Some(&grid)).unwrap();
        let twice = normalize_grid(Some(&once.grid_json())).unwrap();

        assert_eq!(once.columns, twice.columns);
        assert_eq!(once.grid, twice.grid);
        assert_eq!(once.sidx, twice.sidx);
    }

    #[test]
    fn test_non_object_entries_skipped() {
        let grid = r#"{"columns":["id", 3, {"prop":"name"}]}"#;
        let result = normalize_grid(Some(grid)).unwrap();
        assert_eq!(names(result.columns.as_ref().unwrap()), vec!["name"]);
    }

    #[test]
    fn test_column_without_prop_has_no_name() {
        let grid = r#"{"columns":[{"label":"Only label"}]}"#;
        let result = normalize_grid(Some(grid)).unwrap();
        assert_eq!(result.grid["columns"], json!([{}]));
    }

    #[test]
    fn test_malformed_grid_is_error() {
        let err = normalize_grid(Some("{\"columns\": [")).unwrap_err();
        assert_eq!(err.field(), "grid");

        let err = normalize_grid(Some(r#"{"columns":"[{broken"}"#)).unwrap_err();
        assert_eq!(err.field(), "columns");
    }
}
