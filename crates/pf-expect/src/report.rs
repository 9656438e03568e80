//! Markdown summary of the last validation run

use crate::checkpoint::CheckpointResult;
use crate::error::{ExpectError, ExpectResult};
use crate::validate::ValidationReport;
use chrono::{DateTime, Utc};
use pf_core::settings::Settings;
use std::fmt::Write;
use std::path::PathBuf;

/// Shown when there is no usable validation result
pub const NO_VALIDATION_MESSAGE: &str = "No validation data found. Run `pf validate` first.";

/// Render the report document
pub fn render_report(validation: Option<&ValidationReport>, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Pipeline Run Report");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated: {} UTC",
        generated_at.format("%Y-%m-%dT%H:%M:%S%.6f")
    );
    let _ = writeln!(out);

    let Some(validation) = validation else {
        let _ = writeln!(out, "{}", NO_VALIDATION_MESSAGE);
        return out;
    };

    let _ = writeln!(
        out,
        "Cleaned partition: {}",
        validation.cleaned_partition.as_deref().unwrap_or("none")
    );
    let _ = writeln!(
        out,
        "Aggregated partition: {}",
        validation.agg_partition.as_deref().unwrap_or("none")
    );
    let _ = writeln!(out);

    if let Some(result) = &validation.results.cleaned {
        section(&mut out, "Cleaned Asset Validation", result);
    }
    if let Some(result) = &validation.results.agg {
        section(&mut out, "Aggregated Asset Validation", result);
    }
    out
}

fn section(out: &mut String, title: &str, result: &CheckpointResult) {
    let _ = writeln!(out, "## {}", title);
    let _ = writeln!(out);
    let _ = writeln!(out, "Success: {}", result.success);
    let _ = writeln!(
        out,
        "Total Expectations: {}",
        result.statistics.evaluated_expectations
    );
    let _ = writeln!(
        out,
        "Successful Expectations: {}",
        result.statistics.successful_expectations
    );
    let _ = writeln!(out);
}

/// Render the report from `last_validation.json` into `last_report.md`.
///
/// A missing or unreadable validation file renders the placeholder; only
/// failing to write the report is an error.
pub fn write_report(settings: &Settings) -> ExpectResult<PathBuf> {
    let validation_path = settings.last_validation_path();
    let validation = if validation_path.is_file() {
        match ValidationReport::load(&validation_path) {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("Ignoring unreadable validation result: {}", e);
                None
            }
        }
    } else {
        None
    };

    let report_path = settings.last_report_path();
    std::fs::create_dir_all(&settings.reports_dir)
        .map_err(|e| ExpectError::io(&settings.reports_dir, e))?;
    std::fs::write(&report_path, render_report(validation.as_ref(), Utc::now()))
        .map_err(|e| ExpectError::io(&report_path, e))?;
    Ok(report_path)
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
