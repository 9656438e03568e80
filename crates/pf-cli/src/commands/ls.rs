//! List command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pf_core::definitions::{AssetSpec, Definitions};
use serde::Serialize;

use crate::cli::{GlobalArgs, LsArgs, TableOutput};
use crate::commands::common::load_definitions;

/// Execute the ls command
pub async fn execute(args: &LsArgs, _global: &GlobalArgs) -> Result<()> {
    let defs = load_definitions()?;
    let listing = Listing::build(&defs, Utc::now())?;

    match args.output {
        TableOutput::Table => print_table(&listing),
        TableOutput::Json => println!(
            "{}",
            serde_json::to_string_pretty(&listing).context("Failed to serialize to JSON")?
        ),
    }
    Ok(())
}

/// Assets in dependency order with job and schedule details
#[derive(Debug, Serialize)]
struct Listing<'a> {
    assets: Vec<&'a AssetSpec>,
    jobs: Vec<JobInfo<'a>>,
    partitions_start: String,
}

#[derive(Debug, Serialize)]
struct JobInfo<'a> {
    name: &'a str,
    assets: Vec<&'a str>,
    schedule: Option<&'a str>,
    cron: Option<&'a str>,
    next_tick: Option<DateTime<Utc>>,
}

impl<'a> Listing<'a> {
    fn build(defs: &'a Definitions, now: DateTime<Utc>) -> Result<Self> {
        let dag = defs.dag().context("Failed to build asset graph")?;
        let order = dag
            .topological_order()
            .context("Failed to order assets")?;
        let assets = order
            .iter()
            .map(|key| defs.asset(key.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .context("Asset graph references an unknown asset")?;

        let jobs = defs
            .jobs
            .iter()
            .map(|job| {
                let schedule = defs.schedules.iter().find(|s| s.job == job.name);
                JobInfo {
                    name: &job.name,
                    assets: job.assets.iter().map(|a| a.as_str()).collect(),
                    schedule: schedule.map(|s| s.name.as_str()),
                    cron: schedule.map(|s| s.cron.as_str()),
                    next_tick: schedule.and_then(|s| s.next_tick(now)),
                }
            })
            .collect();

        Ok(Self {
            assets,
            jobs,
            partitions_start: defs.partitions.start().to_string(),
        })
    }
}

fn print_table(listing: &Listing<'_>) {
    let name_width = listing
        .assets
        .iter()
        .map(|a| a.key.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);
    let table_width = listing
        .assets
        .iter()
        .map(|a| a.table.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let deps_width = 14;

    println!(
        "{:<name_width$}  {:<table_width$}  {:<deps_width$}  {:<9}  CHECKS",
        "NAME", "TABLE", "DEPENDS_ON", "MAX_LAG",
    );
    println!(
        "{:-<name_width$}  {:-<table_width$}  {:-<deps_width$}  {:-<9}  {}",
        "",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for asset in &listing.assets {
        let deps = if asset.upstream.is_empty() {
            "-".to_string()
        } else {
            asset
                .upstream
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "{:<name_width$}  {:<table_width$}  {:<deps_width$}  {:<9}  {}",
            asset.key.as_str(),
            asset.table,
            deps,
            format!("{}m", asset.freshness.maximum_lag_minutes),
            asset.checks.join(", "),
        );
    }

    println!();
    println!(
        "{} assets, daily partitions from {}",
        listing.assets.len(),
        listing.partitions_start
    );
    for job in &listing.jobs {
        print!("job {} [{}]", job.name, job.assets.join(" -> "));
        match (job.schedule, job.cron) {
            (Some(schedule), Some(cron)) => {
                let next = job
                    .next_tick
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!("  schedule {} '{}', next tick {}", schedule, cron, next);
            }
            _ => println!("  unscheduled"),
        }
    }
}

#[cfg(test)]
#[path = "ls_test.rs"]
mod tests;
