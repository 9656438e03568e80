//! Stage-level data checks
//!
//! Checks run over the in-memory rows a stage just produced. A failing check
//! is a value, not an error: it is reported next to the materialization and
//! never stops the run.

use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Missing-value ratio at or above which the null check fails
pub const DEFAULT_NULL_RATIO_THRESHOLD: f64 = 0.01;

/// Outcome of one check against one asset partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCheckResult {
    /// Check name (e.g. `cleaned_null_threshold`)
    pub check_name: String,

    /// Asset the check belongs to
    pub asset_key: String,

    /// Whether the check passed
    pub passed: bool,

    /// Check-specific metadata
    pub metadata: Map<String, Value>,
}

impl AssetCheckResult {
    fn new(check_name: &str, asset_key: &str, passed: bool, metadata: Map<String, Value>) -> Self {
        Self {
            check_name: check_name.to_string(),
            asset_key: asset_key.to_string(),
            passed,
            metadata,
        }
    }
}

/// Pass when at least one row exists. Metadata: `row_count`.
pub fn row_count_positive<R: Record>(
    check_name: &str,
    asset_key: &str,
    rows: &[R],
) -> AssetCheckResult {
    let mut metadata = Map::new();
    metadata.insert("row_count".to_string(), json!(rows.len()));
    AssetCheckResult::new(check_name, asset_key, !rows.is_empty(), metadata)
}

/// Count missing values per column, in column order
pub fn null_counts<R: Record>(rows: &[R]) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = R::COLUMNS.iter().map(|c| (c.name, 0)).collect();
    for row in rows {
        for (slot, value) in counts.iter_mut().zip(row.to_values()) {
            if value.is_missing() {
                slot.1 += 1;
            }
        }
    }
    counts
}

/// Pass when every column's missing-value ratio is strictly below
/// `threshold`.
///
/// Metadata: `null_counts` and `null_ratio`, keyed by column. With no rows
/// the ratios are undefined (`null`) and the check fails.
pub fn null_threshold<R: Record>(
    check_name: &str,
    asset_key: &str,
    rows: &[R],
    threshold: f64,
) -> AssetCheckResult {
    let counts = null_counts(rows);
    let total = rows.len();

    let mut null_counts_json = Map::new();
    let mut null_ratio_json = Map::new();
    let mut passed = total > 0;

    for (column, count) in counts {
        null_counts_json.insert(column.to_string(), json!(count));
        if total == 0 {
            null_ratio_json.insert(column.to_string(), Value::Null);
            continue;
        }
        let ratio = count as f64 / total as f64;
        if ratio >= threshold {
            passed = false;
        }
        null_ratio_json.insert(column.to_string(), json!(ratio));
    }

    let mut metadata = Map::new();
    metadata.insert("null_counts".to_string(), Value::Object(null_counts_json));
    metadata.insert("null_ratio".to_string(), Value::Object(null_ratio_json));
    AssetCheckResult::new(check_name, asset_key, passed, metadata)
}

#[cfg(test)]
#[path = "checks_test.rs"]
mod tests;
