//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use pf_core::definitions::Definitions;
use pf_core::partition::PartitionKey;
use pf_core::settings::Settings;
use pf_pipeline::{AssetStatus, JobRunResult};
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs maps it to the process exit status.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Resolve settings against the project directory and the environment
pub(crate) fn load_settings(global: &GlobalArgs) -> Settings {
    let settings = Settings::from_env(Path::new(&global.project_dir));
    log::debug!("Resolved settings: {:?}", settings);
    settings
}

/// The built-in asset graph, job and schedule
pub(crate) fn load_definitions() -> Result<Definitions> {
    Definitions::standard().context("Failed to build asset definitions")
}

/// Parse a `YYYY-MM-DD` command-line partition
pub(crate) fn parse_partition(value: &str) -> Result<PartitionKey> {
    PartitionKey::parse(value).with_context(|| format!("Invalid partition '{}'", value))
}

/// Print a job run as one line per asset plus its checks
pub(crate) fn print_run_result(result: &JobRunResult) {
    println!(
        "Run {} for {} ({})",
        result.run_id, result.partition_key, result.job_name
    );
    for asset in &result.assets {
        let marker = match asset.status {
            AssetStatus::Materialized => "✓",
            AssetStatus::Failed => "✗",
            AssetStatus::Skipped => "-",
        };
        println!(
            "  {} {:<14} {:<12} {:>4} rows  ({}ms)",
            marker, asset.asset_key, asset.status, asset.records, asset.duration_ms
        );
        if let Some(error) = &asset.error {
            println!("      {}", error);
        }
        for check in &asset.checks {
            println!(
                "      check {:<28} {}",
                check.check_name,
                if check.passed { "passed" } else { "FAILED" }
            );
        }
    }
}

/// Exit non-zero when any stage failed; failed checks do not count
pub(crate) fn exit_on_failure(results: &[JobRunResult]) -> Result<()> {
    let failed = results.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        eprintln!("{} run(s) had failed stages", failed);
        return Err(ExitCode(1).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
