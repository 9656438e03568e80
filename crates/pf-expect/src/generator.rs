//! Expectation SQL generation
//!
//! Every query reads from a `batch` CTE holding one partition of one table,
//! so an expectation never sees rows outside the batch under test.

use crate::suite::Expectation;
use pf_core::sql_utils::{escape_sql_string, quote_ident, sql_literal};
use serde_json::Value;

/// Maximum rows returned in `partial_unexpected_list`
pub const PARTIAL_UNEXPECTED_LIMIT: usize = 20;

/// A batch: one partition of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSource<'a> {
    pub table: &'a str,
    pub partition_date: &'a str,
}

impl BatchSource<'_> {
    /// `WITH batch AS (...)` prefix shared by all queries
    pub fn cte(&self) -> String {
        format!(
            "WITH batch AS (SELECT * FROM {} WHERE partition_date = {})",
            quote_ident(self.table),
            sql_literal(self.partition_date)
        )
    }
}

/// Queries for one column-map expectation.
///
/// `counts_sql` returns a single row `(element_count, nonnull_count,
/// unexpected_count)`; `unexpected_sql` returns up to
/// [`PARTIAL_UNEXPECTED_LIMIT`] offending values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapQuery {
    pub counts_sql: String,
    pub unexpected_sql: String,

    /// Whether the unexpected percentage is taken over all rows rather than
    /// non-null rows
    pub over_all_rows: bool,
}

/// How an expectation is evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedExpectation {
    /// Single row count compared against bounds
    RowCount {
        sql: String,
        min_value: Option<f64>,
        max_value: Option<f64>,
    },
    /// Column presence, answered from the table schema
    ColumnExists { column: String },
    /// Per-row predicate with a `mostly` threshold
    ColumnMap { query: ColumnMapQuery, mostly: f64 },
}

/// Compile an expectation against a batch
pub fn generate(expectation: &Expectation, batch: &BatchSource<'_>) -> GeneratedExpectation {
    let cte = batch.cte();
    match expectation {
        Expectation::TableRowCountToBeBetween {
            min_value,
            max_value,
        } => GeneratedExpectation::RowCount {
            sql: format!("{cte}\nSELECT COUNT(*) FROM batch"),
            min_value: *min_value,
            max_value: *max_value,
        },
        Expectation::ColumnToExist { column } => GeneratedExpectation::ColumnExists {
            column: column.clone(),
        },
        Expectation::ColumnValuesToNotBeNull { column, mostly } => {
            let qc = quote_ident(column);
            column_map(
                &cte,
                "batch",
                &qc,
                &format!("{qc} IS NOT NULL"),
                &format!("{qc} IS NULL"),
                true,
                *mostly,
            )
        }
        Expectation::ColumnValuesToBeBetween {
            column,
            min_value,
            max_value,
            strict_min,
            strict_max,
            mostly,
        } => {
            let qc = quote_ident(column);
            let mut outside = Vec::new();
            if let Some(min) = min_value {
                let op = if *strict_min { "<=" } else { "<" };
                outside.push(format!("{qc} {op} {}", number_literal(*min)));
            }
            if let Some(max) = max_value {
                let op = if *strict_max { ">=" } else { ">" };
                outside.push(format!("{qc} {op} {}", number_literal(*max)));
            }
            let predicate = if outside.is_empty() {
                "FALSE".to_string()
            } else {
                format!("{qc} IS NOT NULL AND ({})", outside.join(" OR "))
            };
            column_map(
                &cte,
                "batch",
                &qc,
                &format!("{qc} IS NOT NULL"),
                &predicate,
                false,
                *mostly,
            )
        }
        Expectation::ColumnValuesToBeUnique { column, mostly } => {
            let qc = quote_ident(column);
            let source = format!(
                "(SELECT *, COUNT(*) OVER (PARTITION BY {qc}) AS __pf_occurrences FROM batch)"
            );
            column_map(
                &cte,
                &source,
                &qc,
                &format!("{qc} IS NOT NULL"),
                &format!("{qc} IS NOT NULL AND __pf_occurrences > 1"),
                false,
                *mostly,
            )
        }
        Expectation::ColumnValuesToBeInSet {
            column,
            value_set,
            mostly,
        } => {
            let qc = quote_ident(column);
            let predicate = if value_set.is_empty() {
                format!("{qc} IS NOT NULL")
            } else {
                let values: Vec<String> = value_set.iter().map(json_literal).collect();
                format!("{qc} IS NOT NULL AND {qc} NOT IN ({})", values.join(", "))
            };
            column_map(
                &cte,
                "batch",
                &qc,
                &format!("{qc} IS NOT NULL"),
                &predicate,
                false,
                *mostly,
            )
        }
        Expectation::ColumnValuesToMatchRegex {
            column,
            regex,
            mostly,
        } => {
            let qc = quote_ident(column);
            column_map(
                &cte,
                "batch",
                &qc,
                &format!("{qc} IS NOT NULL"),
                &format!(
                    "{qc} IS NOT NULL AND NOT regexp_matches(CAST({qc} AS VARCHAR), '{}')",
                    escape_sql_string(regex)
                ),
                false,
                *mostly,
            )
        }
        Expectation::ColumnPairValuesAToBeGreaterThanB {
            column_a,
            column_b,
            or_equal,
            mostly,
        } => {
            let qa = quote_ident(column_a);
            let qb = quote_ident(column_b);
            let op = if *or_equal { ">=" } else { ">" };
            let both = format!("{qa} IS NOT NULL AND {qb} IS NOT NULL");
            column_map(
                &cte,
                "batch",
                &format!("{qa}, {qb}"),
                &both,
                &format!("{both} AND NOT ({qa} {op} {qb})"),
                false,
                *mostly,
            )
        }
    }
}

fn column_map(
    cte: &str,
    source: &str,
    select: &str,
    nonnull: &str,
    unexpected: &str,
    over_all_rows: bool,
    mostly: f64,
) -> GeneratedExpectation {
    let counts_sql = format!(
        "{cte}\nSELECT COUNT(*), COUNT(*) FILTER (WHERE {nonnull}), \
         COUNT(*) FILTER (WHERE {unexpected})\nFROM {source}"
    );
    let unexpected_sql = format!(
        "{cte}\nSELECT {select}\nFROM {source}\nWHERE {unexpected}\n\
         LIMIT {PARTIAL_UNEXPECTED_LIMIT}"
    );
    GeneratedExpectation::ColumnMap {
        query: ColumnMapQuery {
            counts_sql,
            unexpected_sql,
            over_all_rows,
        },
        mostly,
    }
}

fn number_literal(value: f64) -> String {
    // keep a decimal point so DuckDB compares as DOUBLE, not INTEGER
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn json_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", escape_sql_string(s)),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "NULL".to_string(),
        other => format!("'{}'", escape_sql_string(&other.to_string())),
    }
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
