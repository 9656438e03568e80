//! Job execution over the asset DAG for one partition

use crate::api::MarketDataClient;
use crate::assets::{agg_asset, cleaned_asset, raw_asset, AssetContext, Materialization};
use crate::error::PipelineResult;
use chrono::{DateTime, NaiveDate, Utc};
use pf_core::checks::AssetCheckResult;
use pf_core::definitions::{Definitions, AGG_ASSET, CLEANED_ASSET, DAILY_JOB, RAW_ASSET};
use pf_core::partition::PartitionKey;
use pf_core::prices::{CleanedPrice, RawPrice};
use pf_core::record::Record;
use pf_core::settings::Settings;
use pf_core::{AssetKey, CoreError};
use pf_db::{read_partition, DuckDbBackend};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Run configuration shared by every stage
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Replay the sample payload instead of calling the live endpoint
    pub deterministic: bool,
}

/// Overall status of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Outcome of one asset within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Materialized,
    Failed,
    /// An upstream asset failed or was skipped
    Skipped,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetStatus::Materialized => write!(f, "materialized"),
            AssetStatus::Failed => write!(f, "failed"),
            AssetStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Per-asset result of a run
#[derive(Debug, Clone, Serialize)]
pub struct AssetOutcome {
    pub asset_key: AssetKey,
    pub status: AssetStatus,
    pub records: usize,
    pub checks: Vec<AssetCheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Result of materializing the selected assets for one partition
#[derive(Debug, Clone, Serialize)]
pub struct JobRunResult {
    pub run_id: String,
    pub job_name: String,
    pub partition_key: PartitionKey,
    pub status: RunStatus,
    pub assets: Vec<AssetOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobRunResult {
    /// Whether every selected asset materialized
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Checks that did not pass, across all assets
    pub fn failed_checks(&self) -> impl Iterator<Item = &AssetCheckResult> {
        self.assets
            .iter()
            .flat_map(|a| a.checks.iter())
            .filter(|c| !c.passed)
    }
}

/// Stage outputs kept in memory so downstream assets in the same run do not
/// re-read them from storage
#[derive(Default)]
struct RunOutputs {
    raw: Option<Vec<RawPrice>>,
    cleaned: Option<Vec<CleanedPrice>>,
}

/// Load an upstream partition that was not produced in this run
async fn load_upstream<R: Record>(ctx: &AssetContext<'_>) -> PipelineResult<Vec<R>> {
    let db = DuckDbBackend::open(&ctx.settings.duckdb_path)?;
    let rows = read_partition::<R>(&db, &ctx.partition_key.to_string()).await?;
    db.close()?;
    log::debug!(
        "[{}] loaded {} upstream rows from {}",
        ctx.run_id,
        rows.len(),
        R::TABLE
    );
    Ok(rows)
}

fn outcome<R>(key: &AssetKey, m: Materialization<R>, started: Instant) -> AssetOutcome {
    AssetOutcome {
        asset_key: key.clone(),
        status: AssetStatus::Materialized,
        records: m.record_count(),
        checks: m.checks,
        error: None,
        duration_ms: started.elapsed().as_millis() as u64,
    }
}

async fn run_asset(
    key: &AssetKey,
    ctx: &AssetContext<'_>,
    client: &MarketDataClient,
    config: RunConfig,
    outputs: &mut RunOutputs,
) -> PipelineResult<AssetOutcome> {
    let started = Instant::now();
    match key.as_str() {
        RAW_ASSET => {
            let m = raw_asset(ctx, client, config.deterministic).await?;
            outputs.raw = Some(m.records.clone());
            Ok(outcome(key, m, started))
        }
        CLEANED_ASSET => {
            let raw = match outputs.raw.take() {
                Some(rows) => rows,
                None => load_upstream::<RawPrice>(ctx).await?,
            };
            let m = cleaned_asset(ctx, &raw).await?;
            outputs.cleaned = Some(m.records.clone());
            Ok(outcome(key, m, started))
        }
        AGG_ASSET => {
            let cleaned = match outputs.cleaned.take() {
                Some(rows) => rows,
                None => load_upstream::<CleanedPrice>(ctx).await?,
            };
            let m = agg_asset(ctx, &cleaned).await?;
            Ok(outcome(key, m, started))
        }
        other => Err(CoreError::AssetNotFound {
            name: other.to_string(),
        }
        .into()),
    }
}

/// Materialize the selected assets of `daily_job` for one partition.
///
/// Assets run in topological order. A stage error marks the asset failed
/// and its downstream assets skipped; check failures do not affect the run
/// status. Errors returned from this function (bad partition, bad
/// selection) mean nothing ran.
pub async fn run_job(
    settings: &Settings,
    defs: &Definitions,
    partition_key: PartitionKey,
    config: RunConfig,
    selection: Option<&str>,
) -> PipelineResult<JobRunResult> {
    run_job_as_of(settings, defs, partition_key, config, selection, Utc::now().date_naive()).await
}

/// [`run_job`] with an explicit notion of today
pub async fn run_job_as_of(
    settings: &Settings,
    defs: &Definitions,
    partition_key: PartitionKey,
    config: RunConfig,
    selection: Option<&str>,
    today: NaiveDate,
) -> PipelineResult<JobRunResult> {
    defs.partitions.validate(partition_key, today)?;
    let dag = defs.dag()?;
    let selected = dag.select(selection)?;
    let client = MarketDataClient::new(settings)?;

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    log::info!(
        "Run {} of {} for partition {}: {} asset(s)",
        run_id,
        DAILY_JOB,
        partition_key,
        selected.len()
    );

    let ctx = AssetContext {
        settings,
        partition_key,
        run_id: &run_id,
    };
    let mut outputs = RunOutputs::default();
    let mut blocked: HashSet<String> = HashSet::new();
    let mut assets = Vec::with_capacity(selected.len());

    for key in &selected {
        let upstream_blocked = dag
            .dependencies(key)
            .iter()
            .any(|dep| blocked.contains(dep));
        if upstream_blocked {
            log::warn!("Skipping {}: an upstream asset did not materialize", key);
            blocked.insert(key.to_string());
            assets.push(AssetOutcome {
                asset_key: key.clone(),
                status: AssetStatus::Skipped,
                records: 0,
                checks: Vec::new(),
                error: None,
                duration_ms: 0,
            });
            continue;
        }

        match run_asset(key, &ctx, &client, config, &mut outputs).await {
            Ok(outcome) => {
                log::info!("Materialized {} ({} records)", key, outcome.records);
                for check in outcome.checks.iter().filter(|c| !c.passed) {
                    log::warn!("Check {} failed on {}", check.check_name, key);
                }
                assets.push(outcome);
            }
            Err(e) => {
                log::error!("Asset {} failed: {}", key, e);
                blocked.insert(key.to_string());
                assets.push(AssetOutcome {
                    asset_key: key.clone(),
                    status: AssetStatus::Failed,
                    records: 0,
                    checks: Vec::new(),
                    error: Some(e.to_string()),
                    duration_ms: 0,
                });
            }
        }
    }

    let status = if blocked.is_empty() {
        RunStatus::Success
    } else {
        RunStatus::Failed
    };
    Ok(JobRunResult {
        run_id,
        job_name: DAILY_JOB.to_string(),
        partition_key,
        status,
        assets,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Run the job for every partition in `[first, last]`, in order.
///
/// A failed partition does not stop the backfill. `on_partition` is called
/// after each run.
pub async fn backfill<F>(
    settings: &Settings,
    defs: &Definitions,
    first: PartitionKey,
    last: PartitionKey,
    config: RunConfig,
    mut on_partition: F,
) -> PipelineResult<Vec<JobRunResult>>
where
    F: FnMut(&JobRunResult),
{
    let today = Utc::now().date_naive();
    let keys = defs.partitions.keys_between(first, last, today)?;
    let mut results = Vec::with_capacity(keys.len());
    for key in keys {
        let result = run_job_as_of(settings, defs, key, config, None, today).await?;
        if !result.succeeded() {
            log::warn!("Backfill partition {} failed; continuing", key);
        }
        on_partition(&result);
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
#[path = "job_test.rs"]
mod tests;
