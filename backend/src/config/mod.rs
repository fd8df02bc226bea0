//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded when present)
//! and can be overridden by CLI flags.
//!
//! | Variable                 | Default                            |
//! |--------------------------|------------------------------------|
//! | `GRIDSCRIBE_STORE`       | `grid_config.db`                   |
//! | `GRIDSCRIBE_OUTPUT`      | `output/grid_config_report.xlsx`   |
//! | `GRIDSCRIBE_URL_PATTERN` | `!select.*\.m$`                    |
//! | `GRIDSCRIBE_PORT`        | `3000`                             |

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::collection::DEFAULT_URL_PATTERN;

pub const DEFAULT_STORE: &str = "grid_config.db";

/// Fixed relative path of the generated report.
pub const DEFAULT_OUTPUT: &str = "output/grid_config_report.xlsx";

pub const DEFAULT_PORT: u16 = 3000;

/// Settings for one report job and the HTTP trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Configuration store: SQLite database or JSON/CSV export.
    pub store: PathBuf,

    /// Spreadsheet written by the report job.
    pub output: PathBuf,

    /// URL filter for request-collection ingestion.
    pub collection_pattern: String,

    /// HTTP server port.
    pub port: u16,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE),
            output: PathBuf::from(DEFAULT_OUTPUT),
            collection_pattern: DEFAULT_URL_PATTERN.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ReportConfig {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or empty values keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            store: get("GRIDSCRIBE_STORE").map(PathBuf::from).unwrap_or(defaults.store),
            output: get("GRIDSCRIBE_OUTPUT").map(PathBuf::from).unwrap_or(defaults.output),
            collection_pattern: get("GRIDSCRIBE_URL_PATTERN")
                .unwrap_or(defaults.collection_pattern),
            port: get("GRIDSCRIBE_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    pub fn with_store(mut self, store: Option<PathBuf>) -> Self {
        if let Some(store) = store {
            self.store = store;
        }
        self
    }

    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        if let Some(output) = output {
            self.output = output;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ReportConfig::from_lookup(|_| None);
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.output, PathBuf::from("output/grid_config_report.xlsx"));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_env_values() {
        let vars: HashMap<&str, &str> = [
            ("GRIDSCRIBE_STORE", "rows.csv"),
            ("GRIDSCRIBE_OUTPUT", "out/report.xlsx"),
            ("GRIDSCRIBE_PORT", "8080"),
            ("GRIDSCRIBE_URL_PATTERN", ""),
        ]
        .into_iter()
        .collect();

        let config = ReportConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.store, PathBuf::from("rows.csv"));
        assert_eq!(config.output, PathBuf::from("out/report.xlsx"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.collection_pattern, DEFAULT_URL_PATTERN);
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = ReportConfig::from_lookup(|k| {
            (k == "GRIDSCRIBE_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_cli_overrides() {
        let config = ReportConfig::default()
            .with_store(Some(PathBuf::from("export.json")))
            .with_output(None);
        assert_eq!(config.store, PathBuf::from("export.json"));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
    }
}
