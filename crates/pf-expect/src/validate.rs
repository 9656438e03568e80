//! Validation of the newest cleaned and aggregated partitions

use crate::checkpoint::{Batch, Checkpoint, CheckpointResult};
use crate::error::{ExpectError, ExpectResult};
use crate::store::{write_json_atomic, ExpectationStore};
use chrono::{DateTime, Utc};
use pf_core::prices::{CLEANED_PRICES_TABLE, DAILY_AGG_TABLE};
use pf_core::settings::Settings;
use pf_db::{Database, DuckDbBackend};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CLEANED_SUITE: &str = "cleaned_suite";
pub const AGG_SUITE: &str = "agg_suite";
pub const CLEANED_CHECKPOINT: &str = "cleaned_checkpoint";
pub const AGG_CHECKPOINT: &str = "agg_checkpoint";

/// Suite documents scaffolded by `pf init`, keyed by suite name
pub const DEFAULT_SUITES: [(&str, &str); 2] = [
    (CLEANED_SUITE, include_str!("../suites/cleaned_suite.json")),
    (AGG_SUITE, include_str!("../suites/agg_suite.json")),
];

/// Per-table checkpoint results; a table with no rows has no entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned: Option<CheckpointResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg: Option<CheckpointResult>,
}

/// Combined document written to `last_validation.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_at: DateTime<Utc>,
    pub cleaned_partition: Option<String>,
    pub agg_partition: Option<String>,
    pub results: ValidationResults,
}

impl ValidationReport {
    /// Read a previously written report
    pub fn load(path: &Path) -> ExpectResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ExpectError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Whether every checkpoint that ran succeeded
    pub fn success(&self) -> bool {
        [&self.results.cleaned, &self.results.agg]
            .into_iter()
            .flatten()
            .all(|r| r.success)
    }
}

/// Validate the newest partition of each downstream table and write the
/// combined report.
///
/// Nothing is written if any checkpoint raises an engine error.
pub async fn run_validation(settings: &Settings) -> ExpectResult<ValidationReport> {
    let mut store = ExpectationStore::new(settings);
    let registered = store.ensure_suites(&[CLEANED_SUITE, AGG_SUITE])?;
    log::debug!("Registered {} expectation suite(s)", registered);

    let db = DuckDbBackend::open(&settings.duckdb_path)?;
    let run_at = Utc::now();
    let outcome = validate_tables(&store, &db, run_at).await;
    db.close()?;
    let report = outcome?;

    write_json_atomic(&settings.last_validation_path(), &report)?;
    log::info!(
        "Validation written to {}",
        settings.last_validation_path().display()
    );
    Ok(report)
}

async fn validate_tables(
    store: &ExpectationStore,
    db: &dyn Database,
    run_at: DateTime<Utc>,
) -> ExpectResult<ValidationReport> {
    let cleaned_partition = newest_partition(db, CLEANED_PRICES_TABLE).await?;
    let agg_partition = newest_partition(db, DAILY_AGG_TABLE).await?;

    let cleaned = match &cleaned_partition {
        Some(key) => Some(
            Checkpoint::new(CLEANED_CHECKPOINT, CLEANED_SUITE)
                .run(store, db, batch(CLEANED_PRICES_TABLE, key), run_at)
                .await?,
        ),
        None => None,
    };
    let agg = match &agg_partition {
        Some(key) => Some(
            Checkpoint::new(AGG_CHECKPOINT, AGG_SUITE)
                .run(store, db, batch(DAILY_AGG_TABLE, key), run_at)
                .await?,
        ),
        None => None,
    };

    Ok(ValidationReport {
        run_at,
        cleaned_partition,
        agg_partition,
        results: ValidationResults { cleaned, agg },
    })
}

async fn newest_partition(db: &dyn Database, table: &str) -> ExpectResult<Option<String>> {
    if !db.relation_exists(table).await? {
        log::warn!("Table {} does not exist, treating as empty", table);
        return Ok(None);
    }
    let partition = db.latest_partition(table).await?;
    if partition.is_none() {
        log::info!("Table {} has no rows, skipping validation", table);
    }
    Ok(partition)
}

fn batch(table: &str, partition_date: &str) -> Batch {
    Batch {
        table: table.to_string(),
        partition_date: partition_date.to_string(),
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
