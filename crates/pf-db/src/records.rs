//! Typed persistence for [`Record`] rows

use crate::error::DbResult;
use crate::traits::Database;
use pf_core::record::Record;

/// Create the record's table if needed
pub async fn ensure_table<R: Record>(db: &dyn Database) -> DbResult<()> {
    db.create_table_if_not_exists(R::TABLE, R::COLUMNS).await
}

/// Replace one partition of the record's table with `rows`.
///
/// Creates the table on first use. Every row must belong to
/// `partition_key`; the caller guarantees that.
pub async fn write_partition<R: Record>(
    db: &dyn Database,
    partition_key: &str,
    rows: &[R],
) -> DbResult<usize> {
    ensure_table::<R>(db).await?;
    let values = rows.iter().map(Record::to_values).collect();
    db.replace_partition(R::TABLE, R::COLUMNS, partition_key, values)
        .await
}

/// Load one partition of the record's table.
///
/// A table that does not exist yet reads as an empty partition.
pub async fn read_partition<R: Record>(db: &dyn Database, partition_key: &str) -> DbResult<Vec<R>> {
    if !db.relation_exists(R::TABLE).await? {
        return Ok(Vec::new());
    }
    let rows = db
        .fetch_partition(R::TABLE, R::COLUMNS, partition_key)
        .await?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(R::from_values(row)?);
    }
    Ok(out)
}
