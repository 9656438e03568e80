//! Backfill command implementation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pf_core::partition::DailyPartitions;
use pf_pipeline::{backfill, RunConfig};

use crate::cli::{BackfillArgs, GlobalArgs};
use crate::commands::common::{exit_on_failure, load_definitions, load_settings, parse_partition};

/// Execute the backfill command
pub async fn execute(args: &BackfillArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let defs = load_definitions()?;
    let start = parse_partition(&args.start)?;
    let end = parse_partition(&args.end)?;
    let config = RunConfig {
        deterministic: args.deterministic,
    };

    let total = expected_partitions(&defs.partitions, start, end)?;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let results = backfill(&settings, &defs, start, end, config, |result| {
        let state = if result.succeeded() { "ok" } else { "failed" };
        pb.set_message(format!("{} {}", result.partition_key, state));
        pb.inc(1);
    })
    .await
    .with_context(|| format!("Failed to backfill {}..{}", start, end))?;
    pb.finish_and_clear();

    let failed: Vec<String> = results
        .iter()
        .filter(|r| !r.succeeded())
        .map(|r| r.partition_key.to_string())
        .collect();
    println!(
        "Backfilled {} partition(s), {} failed",
        results.len(),
        failed.len()
    );
    if !failed.is_empty() {
        println!("Failed partitions: {}", failed.join(", "));
    }

    exit_on_failure(&results)
}

fn expected_partitions(
    partitions: &DailyPartitions,
    start: pf_core::partition::PartitionKey,
    end: pf_core::partition::PartitionKey,
) -> Result<u64> {
    let today = chrono::Utc::now().date_naive();
    let keys = partitions
        .keys_between(start, end, today)
        .context("Invalid backfill range")?;
    Ok(keys.len() as u64)
}
