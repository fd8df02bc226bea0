//! Spreadsheet report: row mapping and XLSX output.
//!
//! Normalized records become [`ReportRow`]s grouped into [`ReportSheet`]s;
//! [`write_report`] renders all sheets into one workbook.
//!
//! # Layout
//!
//! | Col | Header              | Width | Content                         |
//! |-----|---------------------|-------|---------------------------------|
//! | A   | `#`                 | 5     | 1-based row number              |
//! | B   | `Name`              | 30    | record title                    |
//! | C   | `Request URL`       | 40    | endpoint identifier             |
//! | D   | `Request Form-Data` | 80    | enriched data source (120 when last) |
//! | E   | `Grid Config`       | 60    | reduced grid, when any row has one |
//!
//! The document is built in memory and moved into place atomically, so a
//! failed run never leaves a half-written file behind.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{ReportError, ReportResult};
use crate::models::{NormalizedRecord, RecordKind};

/// Fixed headers shared by every sheet.
pub const REPORT_HEADERS: [&str; 4] = ["#", "Name", "Request URL", "Request Form-Data"];

/// Extra header for sheets carrying grid configuration.
pub const GRID_HEADER: &str = "Grid Config";

/// Excel sheet name maximum length.
pub const SHEET_NAME_MAX_LEN: usize = 31;

const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

const GRID_SHEET_WIDTHS: [f64; 5] = [5.0, 30.0, 40.0, 80.0, 60.0];
const PLAIN_SHEET_WIDTHS: [f64; 4] = [5.0, 30.0, 40.0, 120.0];

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// 1-based position within the sheet.
    pub index: usize,
    pub name: Option<String>,
    pub url: Option<String>,
    pub form_data: Option<String>,
    pub grid: Option<String>,
}

/// One sheet of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSheet {
    pub title: String,
    /// Adds the `Grid Config` column.
    pub with_grid: bool,
    pub rows: Vec<ReportRow>,
}

/// Map normalized records to rows, numbered from 1 in input order.
///
/// The `Grid Config` column is added when any record carries grid data.
pub fn sheet_from_records(title: impl Into<String>, records: &[NormalizedRecord]) -> ReportSheet {
    let rows = records
        .iter()
        .enumerate()
        .map(|(i, record)| ReportRow {
            index: i + 1,
            name: record.title.clone(),
            url: record.url.clone(),
            form_data: record.data_source.clone(),
            grid: record.grid.clone(),
        })
        .collect();

    ReportSheet {
        title: title.into(),
        with_grid: records.iter().any(|r| r.grid.is_some()),
        rows,
    }
}

impl ReportSheet {
    /// Sheet for one record kind, titled after it.
    pub fn for_kind(kind: RecordKind, records: &[NormalizedRecord]) -> Self {
        sheet_from_records(kind.sheet_title(), records)
    }

    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = REPORT_HEADERS.to_vec();
        if self.with_grid {
            headers.push(GRID_HEADER);
        }
        headers
    }

    fn column_widths(&self) -> &'static [f64] {
        if self.with_grid {
            &GRID_SHEET_WIDTHS
        } else {
            &PLAIN_SHEET_WIDTHS
        }
    }
}

/// Make a name acceptable as an Excel sheet name.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if SHEET_NAME_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    if cleaned.is_empty() {
        return "Sheet".to_string();
    }
    cleaned.chars().take(SHEET_NAME_MAX_LEN).collect()
}

/// Sanitize and de-duplicate (case-insensitively) against names already used.
fn unique_sheet_name(name: &str, used: &mut BTreeSet<String>) -> String {
    let base = sanitize_sheet_name(name);
    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate.to_lowercase()) {
        n += 1;
        let suffix = format!(" ({})", n);
        let keep = SHEET_NAME_MAX_LEN.saturating_sub(suffix.chars().count());
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
    }
    used.insert(candidate.to_lowercase());
    candidate
}

/// Build the workbook for the given sheets.
pub fn render_workbook(sheets: &[ReportSheet]) -> ReportResult<Workbook> {
    let mut workbook = Workbook::new();
    let wrap = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::VerticalCenter);
    let mut used = BTreeSet::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(unique_sheet_name(&sheet.title, &mut used))?;
        write_sheet(worksheet, sheet, &wrap)?;
    }

    Ok(workbook)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &ReportSheet, wrap: &Format) -> ReportResult<()> {
    for (col, width) in sheet.column_widths().iter().enumerate() {
        worksheet.set_column_width(cell_col(col)?, *width)?;
    }

    for (col, header) in sheet.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, cell_col(col)?, *header, wrap)?;
    }

    for (i, row) in sheet.rows.iter().enumerate() {
        let r = cell_row(i + 1)?;
        worksheet.write_number(r, 0, row.index as f64)?;
        if let Some(ref name) = row.name {
            worksheet.write_string(r, 1, name)?;
        }

        let mut wrapped = vec![&row.url, &row.form_data];
        if sheet.with_grid {
            wrapped.push(&row.grid);
        }
        for (offset, value) in wrapped.into_iter().enumerate() {
            let col = cell_col(2 + offset)?;
            match value {
                Some(text) => worksheet.write_string_with_format(r, col, text, wrap)?,
                None => worksheet.write_blank(r, col, wrap)?,
            };
        }
    }

    Ok(())
}

fn cell_row(idx: usize) -> ReportResult<u32> {
    u32::try_from(idx).map_err(|_| ReportError::Xlsx(XlsxError::RowColumnLimitError))
}

fn cell_col(idx: usize) -> ReportResult<u16> {
    u16::try_from(idx).map_err(|_| ReportError::Xlsx(XlsxError::RowColumnLimitError))
}

/// Render the sheets and write the workbook to `path`.
///
/// The file is written to a temporary sibling and renamed over `path`, so
/// either the full new document or the previous file is left on disk.
/// Missing parent directories are created.
pub fn write_report(path: &Path, sheets: &[ReportSheet]) -> ReportResult<()> {
    let mut workbook = render_workbook(sheets)?;
    let buffer = workbook.save_to_buffer()?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&buffer)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ReportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
