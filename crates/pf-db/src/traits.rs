//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use pf_core::record::{Column, SqlValue};

/// One result row, values in select-list order
pub type Row = Vec<SqlValue>;

/// Database abstraction trait for Priceflow
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// First column of the first row, or `None` when the query returns no rows
    async fn query_one(&self, sql: &str) -> DbResult<Option<SqlValue>>;

    /// All rows of a query
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Column names of a table, in declaration order
    async fn column_names(&self, table: &str) -> DbResult<Vec<String>>;

    /// Create a table from a column schema unless it already exists
    async fn create_table_if_not_exists(&self, table: &str, columns: &[Column]) -> DbResult<()>;

    /// Atomically replace every row of one partition.
    ///
    /// Deletes rows whose `partition_date` equals `partition_key`, then
    /// inserts `rows`, inside a single transaction. Returns rows inserted.
    async fn replace_partition(
        &self,
        table: &str,
        columns: &[Column],
        partition_key: &str,
        rows: Vec<Row>,
    ) -> DbResult<usize>;

    /// Rows of one partition, in `columns` order
    async fn fetch_partition(
        &self,
        table: &str,
        columns: &[Column],
        partition_key: &str,
    ) -> DbResult<Vec<Row>>;

    /// Greatest `partition_date` in `table`, `None` if the table is empty or
    /// does not exist
    async fn latest_partition(&self, table: &str) -> DbResult<Option<String>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
