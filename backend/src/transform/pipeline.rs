//! Report jobs: store → transform → spreadsheet.
//!
//! ```text
//! RecordStore ──fetch(kind)──▶ transform_records ──▶ ReportSheet ──▶ write_report
//!   (direct, query)              (per kind)           (per kind)      (one .xlsx)
//! ```
//!
//! A job either writes the complete document or fails without touching the
//! output path.
//!
//! # Example
//!
//! ```rust,ignore
//! use gridscribe::{open_store, run_report};
//! use std::path::Path;
//!
//! let store = open_store("grid_config.db")?;
//! let summary = run_report(store.as_ref(), Path::new("output/report.xlsx"))?;
//! println!("{} sheets written", summary.sheets.len());
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use super::records::transform_records;
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::collection::{collect_dir, url_pattern};
use crate::config::ReportConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{NormalizedRecord, RecordKind};
use crate::parser::parse_json_object;
use crate::report::{write_report, ReportSheet};
use crate::store::{open_store, RecordStore};

/// Output file of a collection report, inside the collection directory.
pub const COLLECTION_OUTPUT_FILE: &str = "output.xlsx";

/// What a finished job wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub output: PathBuf,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub title: String,
    pub rows: usize,
}

impl ReportSummary {
    fn new(output: &Path, sheets: &[ReportSheet]) -> Self {
        Self {
            output: output.to_path_buf(),
            sheets: sheets
                .iter()
                .map(|s| SheetSummary {
                    title: s.title.clone(),
                    rows: s.rows.len(),
                })
                .collect(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows).sum()
    }
}

/// Fetch and normalize the records of one kind.
pub fn normalize_kind(
    store: &dyn RecordStore,
    kind: RecordKind,
) -> PipelineResult<Vec<NormalizedRecord>> {
    let raw = store.fetch(kind)?;
    log_success(format!("Read {} {} records", raw.len(), kind));

    let normalized = transform_records(kind, &raw)?;
    print_transform_result(kind, &normalized);
    Ok(normalized)
}

/// Build one sheet per record kind.
pub fn build_report(store: &dyn RecordStore) -> PipelineResult<Vec<ReportSheet>> {
    log_info(format!("📖 Reading grid configurations from {}", store.describe()));

    let mut sheets = Vec::with_capacity(RecordKind::ALL.len());
    for kind in RecordKind::ALL {
        let normalized = normalize_kind(store, kind)?;
        sheets.push(ReportSheet::for_kind(kind, &normalized));
    }
    Ok(sheets)
}

/// Run the grid report job against `store`, writing to `output`.
pub fn run_report(store: &dyn RecordStore, output: &Path) -> PipelineResult<ReportSummary> {
    let result = build_report(store).and_then(|sheets| {
        log_info("📝 Writing report...");
        write_report(output, &sheets)?;
        Ok(ReportSummary::new(output, &sheets))
    });

    finish(result)
}

/// Run the grid report job with the store and output from `config`.
pub fn run_report_with_config(config: &ReportConfig) -> PipelineResult<ReportSummary> {
    let store = open_store(&config.store).map_err(|e| {
        log_error(format!("Cannot open store {}: {}", config.store.display(), e));
        PipelineError::from(e)
    })?;
    run_report(store.as_ref(), &config.output)
}

/// Run the collection report job over every `*.json` file in `dir`.
///
/// Writes to `dir/output.xlsx` unless `output` is given.
pub fn run_collection_report(
    dir: &Path,
    pattern: &str,
    output: Option<&Path>,
) -> PipelineResult<ReportSummary> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(COLLECTION_OUTPUT_FILE));

    let result = compile_and_collect(dir, pattern).and_then(|sheets| {
        log_info("📝 Writing report...");
        write_report(&output, &sheets)?;
        Ok(ReportSummary::new(&output, &sheets))
    });

    finish(result)
}

fn compile_and_collect(dir: &Path, pattern: &str) -> PipelineResult<Vec<ReportSheet>> {
    log_info(format!("📖 Reading collections from {}", dir.display()));
    let regex: Regex = url_pattern(pattern)?;
    let sheets = collect_dir(dir, &regex)?;

    if sheets.is_empty() {
        log_warning("No collection files found");
    }
    for sheet in &sheets {
        log_success(format!("{}: {} matching requests", sheet.title, sheet.rows.len()));
    }
    Ok(sheets)
}

fn finish(result: PipelineResult<ReportSummary>) -> PipelineResult<ReportSummary> {
    match result {
        Ok(summary) => {
            log_success(format!(
                "💾 Report written to {} ({} rows)",
                summary.output.display(),
                summary.total_rows()
            ));
            Ok(summary)
        }
        Err(e) => {
            log_error(format!("Report aborted, no document written: {}", e));
            Err(e)
        }
    }
}

/// Records whose data source was empty or absent and were kept as-is.
pub fn passthrough_count(records: &[NormalizedRecord]) -> usize {
    records
        .iter()
        .filter(|r| matches!(parse_json_object("dataSource", r.data_source.as_deref()), Ok(None)))
        .count()
}

fn print_transform_result(kind: RecordKind, records: &[NormalizedRecord]) {
    let with_url = records.iter().filter(|r| r.url.is_some()).count();
    let passthrough = passthrough_count(records);

    log_info(format!(
        "⚙️  {}: {} records, {} with endpoint",
        kind,
        records.len(),
        with_url
    ));
    if passthrough > 0 {
        log_warning(format!("{} records without data source kept as-is", passthrough));
    }
}
