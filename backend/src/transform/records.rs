//! Record transformer: raw configuration rows to normalized report records.
//!
//! For each record with a data source:
//! 1. resolve the endpoint (strategy chosen by [`RecordKind`])
//! 2. merge the query text into the descriptor (query records only)
//! 3. normalize the grid and merge columns/sort into the descriptor
//! 4. serialize the enriched descriptor and the reduced grid
//!
//! Records without a data source pass through untouched. A malformed
//! record fails the whole batch; see [`transform_records`].

use serde_json::Value;

use super::endpoint::{resolve_endpoint, resolve_query_endpoint};
use super::grid::normalize_grid;
use crate::error::{ParseResult, TransformError, TransformResult};
use crate::models::{NormalizedRecord, RawConfigRecord, RecordKind};
use crate::parser::parse_json_object;

/// Normalize direct-invocation records.
pub fn transform_direct(records: &[RawConfigRecord]) -> TransformResult<Vec<NormalizedRecord>> {
    transform_records(RecordKind::Direct, records)
}

/// Normalize query-based records.
pub fn transform_query(records: &[RawConfigRecord]) -> TransformResult<Vec<NormalizedRecord>> {
    transform_records(RecordKind::Query, records)
}

/// Normalize a batch of records of one kind, preserving input order.
///
/// The first malformed record aborts the batch with an error naming its
/// 1-based position and title, so no partial report is ever produced.
pub fn transform_records(
    kind: RecordKind,
    records: &[RawConfigRecord],
) -> TransformResult<Vec<NormalizedRecord>> {
    records
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            transform_record(kind, raw).map_err(|source| TransformError::Record {
                kind,
                index: i + 1,
                title: raw.display_title().to_string(),
                source,
            })
        })
        .collect()
}

/// Normalize one record.
pub fn transform_record(kind: RecordKind, raw: &RawConfigRecord) -> ParseResult<NormalizedRecord> {
    let mut descriptor = match parse_json_object("dataSource", raw.data_source.as_deref())? {
        Some(descriptor) => descriptor,
        None => return Ok(NormalizedRecord::passthrough(kind, raw.clone())),
    };

    let url = match kind {
        RecordKind::Direct => resolve_endpoint(&descriptor)?,
        RecordKind::Query => {
            let endpoint = resolve_query_endpoint(&descriptor, raw.options.as_deref())?;
            endpoint.merge_into(&mut descriptor);
            endpoint.url
        }
    };

    let grid = normalize_grid(raw.grid.as_deref())?;
    grid.merge_into(&mut descriptor);

    Ok(NormalizedRecord {
        kind,
        title: raw.title.clone(),
        url,
        data_source: Some(Value::Object(descriptor).to_string()),
        grid: Some(grid.grid_json()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders_record() -> RawConfigRecord {
        RawConfigRecord::new(
            "Orders",
            r#"{"bean":"orderSvc","method":"list","params":{"status":"open"}}"#,
            r#"{"columns":[{"prop":"id","label":"ID"},{"prop":"name","label":"Name","pass":true}],"defaultSort":{"prop":"id","order":"asc"}}"#,
        )
    }

    fn parse(text: &Option<String>) -> Value {
        serde_json::from_str(text.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_direct_end_to_end() {
        let out = transform_direct(&[orders_record()]).unwrap();
        assert_eq!(out.len(), 1);

        let record = &out[0];
        assert_eq!(record.kind, RecordKind::Direct);
        assert_eq!(record.title.as_deref(), Some("Orders"));
        assert_eq!(record.url.as_deref(), Some("orderSvc!list.m?status=open"));
        assert_eq!(
            parse(&record.grid),
            json!({
                "columns": [{ "name": "id" }],
                "defaultSort": { "prop": "id", "order": "asc" }
            })
        );
        assert_eq!(
            record.data_source.as_deref(),
            Some(
                r#"{"bean":"orderSvc","method":"list","params":{"status":"open"},"columns":[{"name":"id"}],"sidx":"id","sord":"asc"}"#
            )
        );
    }

    #[test]
    fn test_query_end_to_end() {
        let raw = RawConfigRecord::new(
            "Stock report",
            r#"{"bean":"reportSvc","method":"query","params":{"ignored":"1"}}"#,
            r#"{"columns":[{"prop":"sku","label":"SKU"}]}"#,
        )
        .with_options(r#"{"extraParamFields":"{\"queryString\":\"SELECT 1\"}"}"#);

        let out = transform_query(&[raw]).unwrap();
        let record = &out[0];

        assert_eq!(record.url.as_deref(), Some("reportSvc!query.m"));
        let ds = parse(&record.data_source);
        assert_eq!(ds["queryString"], "SELECT 1");
        assert_eq!(ds["columns"], json!([{ "name": "sku" }]));
        assert!(ds.get("sidx").is_none());
        assert!(ds.get("sord").is_none());
    }

    #[test]
    fn test_missing_endpoint_leaves_url_unset() {
        let raw = RawConfigRecord::new(
            "No bean",
            r#"{"method":"list","params":{"a":"1"}}"#,
            r#"{"defaultSort":{"prop":"id"}}"#,
        );
        let record = transform_record(RecordKind::Direct, &raw).unwrap();

        assert_eq!(record.url, None);
        let ds = parse(&record.data_source);
        assert_eq!(ds["sidx"], "id");
        assert!(ds.get("sord").is_none());
        assert_eq!(ds["params"], json!({ "a": "1" }));
    }

    #[test]
    fn test_empty_data_source_passes_through() {
        let raw = RawConfigRecord {
            title: Some("Static".into()),
            data_source: Some(String::new()),
            grid: Some(r#"{"columns":[{"prop":"x","pass":true}],"height":300}"#.into()),
            options: None,
        };
        let record = transform_record(RecordKind::Direct, &raw).unwrap();

        assert_eq!(record.url, None);
        assert_eq!(record.data_source.as_deref(), Some(""));
        assert_eq!(record.grid, raw.grid);
    }

    #[test]
    fn test_empty_grid_yields_empty_object() {
        let raw = RawConfigRecord {
            title: Some("Bare".into()),
            data_source: Some(r#"{"bean":"b","method":"m"}"#.into()),
            grid: None,
            options: None,
        };
        let record = transform_record(RecordKind::Direct, &raw).unwrap();

        assert_eq!(record.grid.as_deref(), Some("{}"));
        assert_eq!(record.data_source.as_deref(), Some(r#"{"bean":"b","method":"m"}"#));
    }

    #[test]
    fn test_order_preserved() {
        let records: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| {
                RawConfigRecord::new(
                    *name,
                    format!(r#"{{"bean":"{}","method":"list"}}"#, name),
                    "",
                )
            })
            .collect();

        let out = transform_direct(&records).unwrap();
        let urls: Vec<_> = out.iter().filter_map(|r| r.url.as_deref()).collect();
        assert_eq!(urls, vec!["a!list.m", "b!list.m", "c!list.m"]);
    }

    #[test]
    fn test_malformed_record_aborts_batch() {
        let records = vec![
            orders_record(),
            RawConfigRecord::new("Broken", r#"{"bean":"x","method":"y"}"#, "{columns:"),
        ];

        let err = transform_direct(&records).unwrap_err();
        let TransformError::Record { kind, index, title, source } = err;
        assert_eq!(kind, RecordKind::Direct);
        assert_eq!(index, 2);
        assert_eq!(title, "Broken");
        assert_eq!(source.field(), "grid");
    }

    #[test]
    fn test_malformed_options_aborts_query_batch() {
        let raw = RawConfigRecord::new("Q", r#"{"bean":"x","method":"y"}"#, "")
            .with_options("{not json");

        let err = transform_query(&[raw]).unwrap_err();
        assert!(err.to_string().contains("'options'"));
    }

    #[test]
    fn test_options_ignored_for_direct_records() {
        let raw = RawConfigRecord::new("D", r#"{"bean":"x","method":"y"}"#, "")
            .with_options(r#"{"extraParamFields":"{\"queryString\":\"SELECT 1\"}"}"#);

        let record = transform_record(RecordKind::Direct, &raw).unwrap();
        assert!(!record.data_source.unwrap().contains("queryString"));
    }
}
