//! Checkpoints: run a suite against one batch and aggregate the outcome

use crate::error::ExpectResult;
use crate::generator::{generate, BatchSource, ColumnMapQuery, GeneratedExpectation};
use crate::store::ExpectationStore;
use crate::suite::{Expectation, ExpectationConfig};
use chrono::{DateTime, Utc};
use pf_core::record::SqlValue;
use pf_db::{Database, DbResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Format of generated run names, e.g. `20240502T020000.000000Z`
pub const RUN_NAME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// Binds a named suite to batches it will validate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub name: String,
    pub suite_name: String,
}

/// Identifies the data under validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub table: String,
    pub partition_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentifier {
    pub run_name: String,
    pub run_time: DateTime<Utc>,
}

impl RunIdentifier {
    pub fn at(run_time: DateTime<Utc>) -> Self {
        Self {
            run_name: run_time.format(RUN_NAME_FORMAT).to_string(),
            run_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointStatistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub success_percent: f64,
}

impl CheckpointStatistics {
    fn from_results(results: &[ExpectationResult]) -> Self {
        let evaluated = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let success_percent = if evaluated == 0 {
            100.0
        } else {
            successful as f64 / evaluated as f64 * 100.0
        };
        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent,
        }
    }
}

/// Measured values for one expectation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_percent: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_unexpected_list: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub raised_exception: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

/// Outcome of one expectation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub expectation_config: ExpectationConfig,
    pub success: bool,
    pub result: ResultDetail,
    pub exception_info: ExceptionInfo,
}

impl ExpectationResult {
    fn measured(config: &ExpectationConfig, success: bool, result: ResultDetail) -> Self {
        Self {
            expectation_config: config.clone(),
            success,
            result,
            exception_info: ExceptionInfo::default(),
        }
    }

    fn exception(config: &ExpectationConfig, message: String) -> Self {
        Self {
            expectation_config: config.clone(),
            success: false,
            result: ResultDetail::default(),
            exception_info: ExceptionInfo {
                raised_exception: true,
                exception_message: Some(message),
            },
        }
    }
}

/// Aggregated outcome of a checkpoint run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint_name: String,
    pub suite_name: String,
    pub run_id: RunIdentifier,
    pub batch: Batch,
    pub success: bool,
    pub statistics: CheckpointStatistics,
    pub results: Vec<ExpectationResult>,
}

impl Checkpoint {
    pub fn new(name: impl Into<String>, suite_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            suite_name: suite_name.into(),
        }
    }

    /// Evaluate every expectation of the suite against `batch` and store
    /// the result.
    ///
    /// Failing expectations and expectations that cannot be evaluated are
    /// reported in the result. Only an unregistered suite, a missing table
    /// or a store write failure is an error.
    pub async fn run(
        &self,
        store: &ExpectationStore,
        db: &dyn Database,
        batch: Batch,
        run_time: DateTime<Utc>,
    ) -> ExpectResult<CheckpointResult> {
        let suite = store.suite(&self.suite_name)?;
        let expectations = suite.compile()?;
        let columns = db.column_names(&batch.table).await?;
        let source = BatchSource {
            table: &batch.table,
            partition_date: &batch.partition_date,
        };

        let mut results = Vec::with_capacity(expectations.len());
        for (config, expectation) in suite.expectations.iter().zip(&expectations) {
            let result = evaluate(db, config, expectation, &source, &columns).await;
            log::debug!(
                "{} {} on {}: {}",
                self.name,
                config.expectation_type,
                batch.table,
                if result.success { "pass" } else { "fail" }
            );
            results.push(result);
        }

        let statistics = CheckpointStatistics::from_results(&results);
        let result = CheckpointResult {
            checkpoint_name: self.name.clone(),
            suite_name: self.suite_name.clone(),
            run_id: RunIdentifier::at(run_time),
            batch,
            success: statistics.unsuccessful_expectations == 0,
            statistics,
            results,
        };
        store.save_result(&result)?;
        Ok(result)
    }
}

async fn evaluate(
    db: &dyn Database,
    config: &ExpectationConfig,
    expectation: &Expectation,
    source: &BatchSource<'_>,
    columns: &[String],
) -> ExpectationResult {
    let has_column = |name: &str| columns.iter().any(|c| c == name);

    if !matches!(expectation, Expectation::ColumnToExist { .. }) {
        if let Some(missing) = expectation.columns().into_iter().find(|&c| !has_column(c)) {
            return ExpectationResult::exception(
                config,
                format!("column '{}' not found in table '{}'", missing, source.table),
            );
        }
    }

    let measured = match generate(expectation, source) {
        GeneratedExpectation::ColumnExists { column } => {
            let exists = has_column(column.as_str());
            Ok((
                exists,
                ResultDetail {
                    observed_value: Some(Value::Bool(exists)),
                    ..ResultDetail::default()
                },
            ))
        }
        GeneratedExpectation::RowCount {
            sql,
            min_value,
            max_value,
        } => row_count(db, &sql, min_value, max_value).await,
        GeneratedExpectation::ColumnMap { query, mostly } => column_map(db, &query, mostly).await,
    };
    match measured {
        Ok((success, detail)) => ExpectationResult::measured(config, success, detail),
        Err(e) => ExpectationResult::exception(config, e.to_string()),
    }
}

async fn row_count(
    db: &dyn Database,
    sql: &str,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> DbResult<(bool, ResultDetail)> {
    let count = as_count(db.query_one(sql).await?);
    let n = count as f64;
    let success = min_value.map_or(true, |min| n >= min) && max_value.map_or(true, |max| n <= max);
    Ok((
        success,
        ResultDetail {
            observed_value: Some(Value::from(count)),
            ..ResultDetail::default()
        },
    ))
}

async fn column_map(
    db: &dyn Database,
    query: &ColumnMapQuery,
    mostly: f64,
) -> DbResult<(bool, ResultDetail)> {
    let row = db
        .query_rows(&query.counts_sql)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();
    let mut counts = row.into_iter().map(|v| as_count(Some(v)));
    let element_count = counts.next().unwrap_or(0);
    let nonnull_count = counts.next().unwrap_or(0);
    let unexpected_count = counts.next().unwrap_or(0);

    let denominator = if query.over_all_rows {
        element_count
    } else {
        nonnull_count
    };
    let (success, unexpected_percent) = if denominator == 0 {
        (true, None)
    } else {
        let expected = denominator - unexpected_count.min(denominator);
        let expected_ratio = expected as f64 / denominator as f64;
        (
            expected_ratio >= mostly,
            Some(unexpected_count as f64 / denominator as f64 * 100.0),
        )
    };

    let partial_unexpected_list = if unexpected_count == 0 {
        Vec::new()
    } else {
        db.query_rows(&query.unexpected_sql)
            .await?
            .into_iter()
            .map(row_to_json)
            .collect()
    };

    Ok((
        success,
        ResultDetail {
            element_count: Some(element_count),
            unexpected_count: Some(unexpected_count),
            unexpected_percent,
            observed_value: None,
            partial_unexpected_list,
        },
    ))
}

fn as_count(value: Option<SqlValue>) -> u64 {
    match value {
        Some(SqlValue::BigInt(n)) => u64::try_from(n).unwrap_or(0),
        Some(SqlValue::Double(n)) if n.is_finite() && n >= 0.0 => n as u64,
        _ => 0,
    }
}

/// Single-column rows become scalars, wider rows become arrays
fn row_to_json(row: Vec<SqlValue>) -> Value {
    let mut values: Vec<Value> = row.into_iter().map(value_to_json).collect();
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::BigInt(v) => Value::from(v),
        SqlValue::Double(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        SqlValue::Varchar(v) => Value::String(v),
        ts @ SqlValue::Timestamp(_) => Value::String(ts.to_string()),
    }
}

#[cfg(test)]
#[path = "checkpoint_test.rs"]
mod tests;
