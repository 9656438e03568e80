//! The three partitioned pipeline stages
//!
//! Each stage computes its rows for one partition, replaces that partition
//! in its table, and evaluates its checks over the rows it produced. Check
//! failures are returned beside the rows and never fail the stage.

use crate::api::MarketDataClient;
use crate::error::PipelineResult;
use pf_core::checks::{null_threshold, row_count_positive, AssetCheckResult};
use pf_core::definitions::{
    AGG_ASSET, AGG_ROW_COUNT_CHECK, CLEANED_ASSET, CLEANED_NULL_THRESHOLD_CHECK,
    CLEANED_ROW_COUNT_CHECK, RAW_ASSET, RAW_ROW_COUNT_CHECK,
};
use pf_core::partition::PartitionKey;
use pf_core::prices::{aggregate, clean, CleanedPrice, DailyAgg, RawPrice};
use pf_core::record::Record;
use pf_core::settings::Settings;
use pf_core::DEFAULT_NULL_RATIO_THRESHOLD;
use pf_db::{write_partition, DuckDbBackend};
use serde::Serialize;

/// What a stage invocation knows about its run
#[derive(Debug, Clone, Copy)]
pub struct AssetContext<'a> {
    pub settings: &'a Settings,
    pub partition_key: PartitionKey,
    pub run_id: &'a str,
}

/// Output of one stage for one partition
#[derive(Debug, Clone, Serialize)]
pub struct Materialization<R> {
    pub asset_key: &'static str,
    pub partition_key: PartitionKey,
    pub records: Vec<R>,
    pub checks: Vec<AssetCheckResult>,
}

impl<R> Materialization<R> {
    /// Number of rows written
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Whether every check passed
    pub fn checks_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Replace the partition in `R`'s table on a connection scoped to this call
async fn persist<R: Record>(ctx: &AssetContext<'_>, rows: &[R]) -> PipelineResult<()> {
    let db = DuckDbBackend::open(&ctx.settings.duckdb_path)?;
    let key = ctx.partition_key.to_string();
    let written = write_partition(&db, &key, rows).await?;
    db.close()?;
    log::debug!("[{}] wrote {} rows to {} for {}", ctx.run_id, written, R::TABLE, key);
    Ok(())
}

/// Fetch the snapshot and store its first point as one raw row
pub async fn raw_asset(
    ctx: &AssetContext<'_>,
    client: &MarketDataClient,
    deterministic: bool,
) -> PipelineResult<Materialization<RawPrice>> {
    let snapshot = client.fetch(ctx.partition_key, deterministic).await?;
    let rows = vec![snapshot.first_row(ctx.partition_key)?];
    persist(ctx, &rows).await?;

    let checks = vec![row_count_positive(RAW_ROW_COUNT_CHECK, RAW_ASSET, &rows)];
    Ok(Materialization {
        asset_key: RAW_ASSET,
        partition_key: ctx.partition_key,
        records: rows,
        checks,
    })
}

/// Derive UTC timestamps from the raw rows
pub async fn cleaned_asset(
    ctx: &AssetContext<'_>,
    raw: &[RawPrice],
) -> PipelineResult<Materialization<CleanedPrice>> {
    let rows = clean(raw);
    persist(ctx, &rows).await?;

    let checks = vec![
        row_count_positive(CLEANED_ROW_COUNT_CHECK, CLEANED_ASSET, &rows),
        null_threshold(
            CLEANED_NULL_THRESHOLD_CHECK,
            CLEANED_ASSET,
            &rows,
            DEFAULT_NULL_RATIO_THRESHOLD,
        ),
    ];
    Ok(Materialization {
        asset_key: CLEANED_ASSET,
        partition_key: ctx.partition_key,
        records: rows,
        checks,
    })
}

/// Group the cleaned rows by partition and compute daily statistics
pub async fn agg_asset(
    ctx: &AssetContext<'_>,
    cleaned: &[CleanedPrice],
) -> PipelineResult<Materialization<DailyAgg>> {
    let rows = aggregate(cleaned);
    persist(ctx, &rows).await?;

    let checks = vec![row_count_positive(AGG_ROW_COUNT_CHECK, AGG_ASSET, &rows)];
    Ok(Materialization {
        asset_key: AGG_ASSET,
        partition_key: ctx.partition_key,
        records: rows,
        checks,
    })
}

#[cfg(test)]
#[path = "assets_test.rs"]
mod tests;
