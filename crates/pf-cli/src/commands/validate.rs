//! Validate command implementation

use anyhow::{Context, Result};
use pf_expect::run_validation;

use crate::cli::GlobalArgs;
use crate::commands::common::load_settings;

/// Execute the validate command.
///
/// Exits 0 once the validation document is written, whatever the
/// expectations concluded.
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let report = run_validation(&settings)
        .await
        .context("Validation run failed")?;

    for (label, partition, result) in [
        ("cleaned", &report.cleaned_partition, &report.results.cleaned),
        ("agg", &report.agg_partition, &report.results.agg),
    ] {
        match (partition, result) {
            (Some(partition), Some(result)) => println!(
                "{:<8} {}  success={}  {}/{} expectations",
                label,
                partition,
                result.success,
                result.statistics.successful_expectations,
                result.statistics.evaluated_expectations
            ),
            _ => println!("{:<8} no rows to validate", label),
        }
    }
    println!(
        "\nOverall: {}",
        if report.success() { "passed" } else { "failed" }
    );
    println!(
        "Results written to: {}",
        settings.last_validation_path().display()
    );
    Ok(())
}
