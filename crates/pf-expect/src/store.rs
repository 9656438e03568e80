//! File-backed store for expectation suites and checkpoint results
//!
//! ```text
//! <EXPECTATIONS_DIR>/
//!   expectations/<suite>.json
//!   validations/<suite>/<run_name>.json
//! ```

use crate::checkpoint::CheckpointResult;
use crate::error::{ExpectError, ExpectResult};
use crate::suite::ExpectationSuite;
use pf_core::settings::Settings;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Suites and stored validation results
#[derive(Debug, Clone)]
pub struct ExpectationStore {
    suites_dir: PathBuf,
    validations_dir: PathBuf,
    suites: BTreeMap<String, ExpectationSuite>,
}

impl ExpectationStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            suites_dir: settings.suites_dir(),
            validations_dir: settings.validations_dir(),
            suites: BTreeMap::new(),
        }
    }

    /// Register the named suites found in the suites directory.
    ///
    /// Missing suite files are skipped; a file that exists but does not
    /// parse is an error. Returns the number of suites registered.
    pub fn ensure_suites(&mut self, names: &[&str]) -> ExpectResult<usize> {
        let mut registered = 0;
        for name in names {
            let path = self.suites_dir.join(format!("{name}.json"));
            if !path.is_file() {
                log::debug!("No suite file at {}, skipping", path.display());
                continue;
            }
            let suite = ExpectationSuite::load(&path)?;
            if suite.expectation_suite_name != *name {
                log::warn!(
                    "Suite file {} declares name '{}', registering as '{}'",
                    path.display(),
                    suite.expectation_suite_name,
                    name
                );
            }
            self.register(*name, suite);
            registered += 1;
        }
        Ok(registered)
    }

    /// Register a suite held in memory
    pub fn register(&mut self, name: impl Into<String>, suite: ExpectationSuite) {
        self.suites.insert(name.into(), suite);
    }

    /// A registered suite
    pub fn suite(&self, name: &str) -> ExpectResult<&ExpectationSuite> {
        self.suites
            .get(name)
            .ok_or_else(|| ExpectError::SuiteNotRegistered {
                name: name.to_string(),
            })
    }

    /// Names of all registered suites
    pub fn suite_names(&self) -> impl Iterator<Item = &str> {
        self.suites.keys().map(String::as_str)
    }

    /// Persist a checkpoint result under its suite and run name
    pub fn save_result(&self, result: &CheckpointResult) -> ExpectResult<PathBuf> {
        let path = self
            .validations_dir
            .join(&result.suite_name)
            .join(format!("{}.json", result.run_id.run_name));
        write_json_atomic(&path, result)?;
        Ok(path)
    }

    /// Newest stored checkpoint result across all suites.
    ///
    /// Run names sort chronologically, so the newest is the greatest file
    /// name; ties across suites break on the full path.
    pub fn latest_validation_path(&self) -> ExpectResult<Option<PathBuf>> {
        let mut found = Vec::new();
        collect_json_files(&self.validations_dir, &mut found)?;
        Ok(found
            .into_iter()
            .max_by(|a, b| (a.file_name(), a.as_path()).cmp(&(b.file_name(), b.as_path()))))
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> ExpectResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| ExpectError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| ExpectError::io(dir, e))?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

/// Write pretty JSON via a temp file and rename, so readers never see a
/// partial document.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ExpectResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExpectError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension(format!("json.{}.tmp", std::process::id()));
    std::fs::write(&temp_path, json).map_err(|e| ExpectError::io(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        ExpectError::io(path, e)
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
