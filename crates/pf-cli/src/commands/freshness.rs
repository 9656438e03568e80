//! Freshness command implementation
//!
//! Compares each asset's newest stored partition with its freshness policy.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pf_core::definitions::Definitions;
use pf_core::freshness::FreshnessStatus;
use pf_core::partition::PartitionKey;
use pf_core::settings::Settings;
use pf_db::{Database, DuckDbBackend};
use serde::Serialize;

use crate::cli::{FreshnessArgs, GlobalArgs, TableOutput};
use crate::commands::common::{load_definitions, load_settings, ExitCode};

/// Execute the freshness command
pub async fn execute(args: &FreshnessArgs, global: &GlobalArgs) -> Result<()> {
    let settings = load_settings(global);
    let defs = load_definitions()?;
    let results = check_freshness(&settings, &defs, Utc::now()).await?;

    match args.output {
        TableOutput::Table => print_table(&results),
        TableOutput::Json => println!(
            "{}",
            serde_json::to_string_pretty(&results)
                .context("Failed to serialize freshness results")?
        ),
    }

    let not_fresh = results.iter().filter(|r| !r.status.is_fresh()).count();
    if not_fresh > 0 {
        eprintln!("Freshness check: {} of {} assets not fresh", not_fresh, results.len());
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Freshness of one asset
#[derive(Debug, Serialize)]
pub(crate) struct AssetFreshness {
    pub(crate) asset: String,
    pub(crate) table: &'static str,
    pub(crate) maximum_lag_minutes: u32,
    #[serde(flatten)]
    pub(crate) status: FreshnessStatus,
}

/// Evaluate every asset against the newest partition in its table.
///
/// A database that does not exist yet leaves every asset missing.
pub(crate) async fn check_freshness(
    settings: &Settings,
    defs: &Definitions,
    now: DateTime<Utc>,
) -> Result<Vec<AssetFreshness>> {
    let db = if settings.duckdb_path.exists() {
        Some(DuckDbBackend::open(&settings.duckdb_path).context("Failed to open database")?)
    } else {
        log::debug!("No database at {}", settings.duckdb_path.display());
        None
    };

    let mut results = Vec::with_capacity(defs.assets.len());
    for asset in &defs.assets {
        let latest = match &db {
            Some(db) => latest_partition(db, asset.table).await?,
            None => None,
        };
        results.push(AssetFreshness {
            asset: asset.key.to_string(),
            table: asset.table,
            maximum_lag_minutes: asset.freshness.maximum_lag_minutes,
            status: asset.freshness.evaluate(latest, now),
        });
    }

    if let Some(db) = db {
        db.close().context("Failed to close database")?;
    }
    Ok(results)
}

async fn latest_partition(db: &dyn Database, table: &str) -> Result<Option<PartitionKey>> {
    let latest = db
        .latest_partition(table)
        .await
        .with_context(|| format!("Failed to read newest partition of {}", table))?;
    match latest {
        Some(key) => Ok(Some(PartitionKey::parse(&key).with_context(|| {
            format!("Table {} holds an invalid partition '{}'", table, key)
        })?)),
        None => Ok(None),
    }
}

fn print_table(results: &[AssetFreshness]) {
    let name_width = results
        .iter()
        .map(|r| r.asset.len())
        .max()
        .unwrap_or(5)
        .max(5);

    println!(
        "{:<name_width$}  {:<8}  {:<10}  {:>10}  MAX_LAG",
        "ASSET", "STATUS", "LATEST", "LAG",
    );
    println!(
        "{:-<name_width$}  {:-<8}  {:-<10}  {:->10}  {}",
        "",
        "",
        "",
        "",
        "-".repeat(8),
    );
    for r in results {
        let (latest, lag) = match r.status {
            FreshnessStatus::Fresh {
                latest,
                lag_minutes,
            }
            | FreshnessStatus::Stale {
                latest,
                lag_minutes,
            } => (latest.to_string(), format!("{}m", lag_minutes)),
            FreshnessStatus::Missing => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:<name_width$}  {:<8}  {:<10}  {:>10}  {}m",
            r.asset,
            r.status.label(),
            latest,
            lag,
            r.maximum_lag_minutes,
        );
    }
}

#[cfg(test)]
#[path = "freshness_test.rs"]
mod tests;
