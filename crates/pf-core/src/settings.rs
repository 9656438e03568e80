//! Process-wide filesystem settings
//!
//! [`Settings`] is resolved once at startup from environment variables, with
//! defaults relative to the project root, and then passed by reference to
//! every component that needs a path. It is never mutated after construction.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Public market-data endpoint used for live fetches.
pub const DEFAULT_MARKET_DATA_URL: &str =
    "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart";

/// Overrides the data directory (fixture and default database location)
pub const ENV_DATA_DIR: &str = "DATA_DIR";
/// Overrides the reports directory (validation JSON and Markdown report)
pub const ENV_REPORTS_DIR: &str = "REPORTS_DIR";
/// Overrides the expectations directory (suites and stored validations)
pub const ENV_EXPECTATIONS_DIR: &str = "EXPECTATIONS_DIR";
/// Overrides the DuckDB database file
pub const ENV_DUCKDB_PATH: &str = "DUCKDB_PATH";
/// Overrides the market-data endpoint
pub const ENV_MARKET_DATA_URL: &str = "MARKET_DATA_URL";

const LAST_VALIDATION_FILE: &str = "last_validation.json";
const LAST_REPORT_FILE: &str = "last_report.md";
const SAMPLE_PAYLOAD_FILE: &str = "sample_api_payload.json";
const DUCKDB_FILE: &str = "pipeline.duckdb";

/// Resolved filesystem locations for one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Root that relative defaults and relative overrides resolve against
    pub project_root: PathBuf,

    /// Directory holding the sample payload and, by default, the database
    pub data_dir: PathBuf,

    /// Directory receiving `last_validation.json` and `last_report.md`
    pub reports_dir: PathBuf,

    /// Root of the expectation store
    pub expectations_dir: PathBuf,

    /// DuckDB database file holding all pipeline tables
    pub duckdb_path: PathBuf,

    /// Canned payload replayed by deterministic fetches
    pub sample_api_payload: PathBuf,

    /// Endpoint for live fetches
    pub market_data_url: String,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env(project_root: &Path) -> Self {
        Self::from_lookup(project_root, |key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary key lookup.
    ///
    /// Empty values count as unset. `DUCKDB_PATH` defaults to a file inside
    /// the resolved data directory, so a `DATA_DIR` override moves it too.
    pub fn from_lookup<F>(project_root: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let resolve = |value: String| resolve_path(project_root, &value);

        let data_dir = get(ENV_DATA_DIR)
            .map(resolve)
            .unwrap_or_else(|| project_root.join("data"));
        let reports_dir = get(ENV_REPORTS_DIR)
            .map(resolve)
            .unwrap_or_else(|| project_root.join("reports"));
        let expectations_dir = get(ENV_EXPECTATIONS_DIR)
            .map(resolve)
            .unwrap_or_else(|| project_root.join("expectations"));
        let duckdb_path = get(ENV_DUCKDB_PATH)
            .map(resolve)
            .unwrap_or_else(|| data_dir.join(DUCKDB_FILE));
        let market_data_url =
            get(ENV_MARKET_DATA_URL).unwrap_or_else(|| DEFAULT_MARKET_DATA_URL.to_string());

        Self {
            project_root: project_root.to_path_buf(),
            sample_api_payload: data_dir.join(SAMPLE_PAYLOAD_FILE),
            data_dir,
            reports_dir,
            expectations_dir,
            duckdb_path,
            market_data_url,
        }
    }

    /// Path of the combined validation result
    pub fn last_validation_path(&self) -> PathBuf {
        self.reports_dir.join(LAST_VALIDATION_FILE)
    }

    /// Path of the rendered Markdown report
    pub fn last_report_path(&self) -> PathBuf {
        self.reports_dir.join(LAST_REPORT_FILE)
    }

    /// Directory holding expectation suite JSON files
    pub fn suites_dir(&self) -> PathBuf {
        self.expectations_dir.join("expectations")
    }

    /// Directory holding stored checkpoint results
    pub fn validations_dir(&self) -> PathBuf {
        self.expectations_dir.join("validations")
    }
}

fn resolve_path(root: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
