//! REST API types.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};
use crate::transform::pipeline::{ReportSummary, SheetSummary};

/// Optional overrides for one report run (`POST /api/report` body).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReportRequest {
    /// Bare `.xlsx` file name, written next to the configured output.
    pub output: Option<String>,
}

impl ReportRequest {
    /// Resolve the requested file name inside the directory of `default_output`.
    ///
    /// Only a single plain path component ending in `.xlsx` is accepted.
    pub fn output_path(&self, default_output: &Path) -> ServerResult<PathBuf> {
        let Some(ref name) = self.output else {
            return Ok(default_output.to_path_buf());
        };

        let requested = Path::new(name);
        let mut components = requested.components();
        let is_bare_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        let is_xlsx = requested
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if !is_bare_name || !is_xlsx || name.contains(['/', '\\']) {
            return Err(ServerError::BadRequest(format!(
                "output must be a bare .xlsx file name, got '{}'",
                name
            )));
        }

        let dir = default_output.parent().unwrap_or_else(|| Path::new(""));
        Ok(dir.join(requested))
    }
}

/// Response sent after a report job finished.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" when at least one row was written, "empty" otherwise
    pub status: String,

    /// Where the spreadsheet was written
    pub output_path: String,

    pub sheets: Vec<SheetSummary>,

    pub generated_at: DateTime<Utc>,
}

impl From<ReportSummary> for ReportResponse {
    fn from(summary: ReportSummary) -> Self {
        let status = if summary.total_rows() == 0 {
            "empty"
        } else {
            "ready"
        };

        ReportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            output_path: summary.output.display().to_string(),
            sheets: summary.sheets,
            generated_at: Utc::now(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "outputPath": null,
        "sheets": [],
        "generatedAt": Utc::now(),
    })
}
