//! Daemon command implementation
//!
//! Sleeps until each tick of the daily schedule and materializes the
//! partition that just closed. A failed run is logged and the loop goes on.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pf_core::definitions::{Definitions, DAILY_SCHEDULE};
use pf_core::schedule::ScheduleDefinition;
use pf_core::settings::Settings;
use pf_pipeline::{run_job, JobRunResult, RunConfig};

use crate::cli::{DaemonArgs, GlobalArgs};
use crate::commands::common::{load_definitions, load_settings};

/// Execute the daemon command
pub async fn execute(args: &DaemonArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let defs = load_definitions()?;
    let schedule = defs
        .schedule(DAILY_SCHEDULE)
        .with_context(|| format!("Schedule '{}' is not defined", DAILY_SCHEDULE))?;
    let config = RunConfig {
        deterministic: args.deterministic,
    };

    log::info!(
        "Daemon started: schedule {} '{}' runs job {}",
        schedule.name,
        schedule.cron,
        schedule.job
    );

    loop {
        let now = Utc::now();
        let tick = schedule
            .next_tick(now)
            .with_context(|| format!("Schedule '{}' has no upcoming tick", schedule.name))?;
        let wait = (tick - now).to_std().unwrap_or_default();
        log::info!(
            "Next tick at {} for partition {}",
            tick.format("%Y-%m-%d %H:%M UTC"),
            ScheduleDefinition::partition_for_tick(tick)
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    log::warn!("Failed to listen for shutdown signal: {}", e);
                }
                log::info!("Shutting down");
                return Ok(());
            }
        }

        run_tick(&settings, &defs, tick, config).await;
    }
}

/// Materialize the partition for one tick, logging the outcome
pub(crate) async fn run_tick(
    settings: &Settings,
    defs: &Definitions,
    tick: DateTime<Utc>,
    config: RunConfig,
) -> Option<JobRunResult> {
    let partition = ScheduleDefinition::partition_for_tick(tick);
    match run_job(settings, defs, partition, config, None).await {
        Ok(result) => {
            if result.succeeded() {
                log::info!("Scheduled run {} for {} succeeded", result.run_id, partition);
            } else {
                log::error!("Scheduled run {} for {} failed", result.run_id, partition);
            }
            for check in result.failed_checks() {
                log::warn!("Check {} on {} failed", check.check_name, check.asset_key);
            }
            Some(result)
        }
        Err(e) => {
            log::error!("Scheduled run for {} could not start: {}", partition, e);
            None
        }
    }
}

#[cfg(test)]
#[path = "daemon_test.rs"]
mod tests;
