//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use chrono::DateTime;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use pf_core::record::{Column, SqlValue};
use pf_core::sql_utils::{quote_ident, quote_ident_list, sql_literal};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
///
/// The connection is released when the backend is dropped.
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) the database file at `path`, creating parent
    /// directories as needed
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::ConnectionError(format!("{}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{}: {}", e, path.display())))?;
        log::debug!("Opened DuckDB database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the connection, surfacing any error from the driver
    pub fn close(self) -> DbResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        conn.close().map_err(|(_, e)| DbError::CloseError(e.to_string()))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        log::debug!("execute: {}", sql);
        conn.execute(sql, []).map_err(|e| match DbError::from(e) {
            DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{}: {}", msg, sql)),
            other => other,
        })
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query and collect every row
    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        log::debug!("query: {}", sql);
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let value: Value = row.get(i)?;
                values.push(from_duckdb_value(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = {} AND table_name = {}",
            sql_literal(schema),
            sql_literal(table)
        );
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn replace_partition_sync(
        &self,
        table: &str,
        columns: &[Column],
        partition_key: &str,
        rows: &[Row],
    ) -> DbResult<usize> {
        let delete_sql = format!("DELETE FROM {} WHERE partition_date = ?", quote_ident(table));
        let placeholders = vec!["?"; columns.len()];
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            quote_ident_list(columns.iter().map(|c| c.name)),
            placeholders.join(", ")
        );

        let conn = self.lock()?;
        with_transaction(&conn, |conn| {
            let deleted = conn.execute(&delete_sql, [partition_key])?;
            let mut stmt = conn.prepare(&insert_sql)?;
            for row in rows {
                if row.len() != columns.len() {
                    return Err(DbError::ExecutionError(format!(
                        "row for '{}' has {} values, expected {}",
                        table,
                        row.len(),
                        columns.len()
                    )));
                }
                stmt.execute(duckdb::params_from_iter(row.iter().map(to_duckdb_value)))?;
            }
            log::debug!(
                "Replaced partition {} of {}: deleted {}, inserted {}",
                partition_key,
                table,
                deleted,
                rows.len()
            );
            Ok(rows.len())
        })
    }
}

/// Run `body` inside `BEGIN` / `COMMIT`, rolling back on error
fn with_transaction<T>(
    conn: &Connection,
    body: impl FnOnce(&Connection) -> DbResult<T>,
) -> DbResult<T> {
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::TransactionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

fn to_duckdb_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::BigInt(v) => Value::BigInt(*v),
        SqlValue::Double(v) => Value::Double(*v),
        SqlValue::Varchar(v) => Value::Text(v.clone()),
        SqlValue::Timestamp(v) => Value::Timestamp(TimeUnit::Microsecond, v.timestamp_micros()),
    }
}

fn from_duckdb_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::BigInt(i64::from(b)),
        Value::TinyInt(v) => SqlValue::BigInt(v.into()),
        Value::SmallInt(v) => SqlValue::BigInt(v.into()),
        Value::Int(v) => SqlValue::BigInt(v.into()),
        Value::BigInt(v) => SqlValue::BigInt(v),
        Value::UTinyInt(v) => SqlValue::BigInt(v.into()),
        Value::USmallInt(v) => SqlValue::BigInt(v.into()),
        Value::UInt(v) => SqlValue::BigInt(v.into()),
        Value::UBigInt(v) => {
            i64::try_from(v).map_or(SqlValue::Double(v as f64), SqlValue::BigInt)
        }
        Value::HugeInt(v) => {
            i64::try_from(v).map_or(SqlValue::Double(v as f64), SqlValue::BigInt)
        }
        Value::Float(v) => SqlValue::Double(v.into()),
        Value::Double(v) => SqlValue::Double(v),
        Value::Text(s) => SqlValue::Varchar(s),
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            SqlValue::from_timestamp(DateTime::from_timestamp_micros(micros))
        }
        other => SqlValue::Varchar(format!("{:?}", other)),
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count_sql = format!("SELECT COUNT(*) FROM ({})", sql);
        let count: i64 = conn.query_row(&count_sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn query_one(&self, sql: &str) -> DbResult<Option<SqlValue>> {
        let rows = self.query_rows_sync(sql)?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn column_names(&self, table: &str) -> DbResult<Vec<String>> {
        if !self.relation_exists_sync(table)? {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        let sql = format!(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = 'main' AND table_name = {} ORDER BY ordinal_position",
            sql_literal(table)
        );
        Ok(self
            .query_rows_sync(&sql)?
            .into_iter()
            .filter_map(|row| match row.into_iter().next() {
                Some(SqlValue::Varchar(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    async fn create_table_if_not_exists(&self, table: &str, columns: &[Column]) -> DbResult<()> {
        let column_defs: Vec<String> = columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(c.name), c.data_type.sql_name()))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            column_defs.join(", ")
        );
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn replace_partition(
        &self,
        table: &str,
        columns: &[Column],
        partition_key: &str,
        rows: Vec<Row>,
    ) -> DbResult<usize> {
        self.replace_partition_sync(table, columns, partition_key, &rows)
    }

    async fn fetch_partition(
        &self,
        table: &str,
        columns: &[Column],
        partition_key: &str,
    ) -> DbResult<Vec<Row>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE partition_date = {}",
            quote_ident_list(columns.iter().map(|c| c.name)),
            quote_ident(table),
            sql_literal(partition_key)
        );
        self.query_rows_sync(&sql)
    }

    async fn latest_partition(&self, table: &str) -> DbResult<Option<String>> {
        if !self.relation_exists_sync(table)? {
            return Ok(None);
        }
        let sql = format!(
            "SELECT partition_date FROM {} ORDER BY partition_date DESC LIMIT 1",
            quote_ident(table)
        );
        match self.query_rows_sync(&sql)?.into_iter().next() {
            Some(row) => match row.into_iter().next() {
                Some(SqlValue::Varchar(key)) => Ok(Some(key)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
