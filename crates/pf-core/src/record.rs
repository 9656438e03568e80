//! Typed rows and their neutral SQL representation
//!
//! Pipeline tables are plain Rust structs. Each implements [`Record`], which
//! names its table, declares its column schema, and converts to and from a
//! vector of [`SqlValue`]s. The database layer only ever sees the neutral
//! values, so this crate stays free of any driver dependency.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use std::fmt;

/// Column types used by pipeline tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Variable-length text
    Varchar,
    /// 64-bit integer
    BigInt,
    /// 64-bit float
    Double,
    /// UTC timestamp with microsecond precision
    Timestamp,
}

impl ColumnType {
    /// DuckDB type name used in DDL
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A named, typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name
    pub name: &'static str,
    /// Column type
    pub data_type: ColumnType,
}

impl Column {
    /// Declare a column
    pub const fn new(name: &'static str, data_type: ColumnType) -> Self {
        Self { name, data_type }
    }
}

/// A single cell value, independent of any database driver
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    BigInt(i64),
    Double(f64),
    Varchar(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Whether the value counts as missing (NULL or NaN)
    pub fn is_missing(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Double(v) => v.is_nan(),
            _ => false,
        }
    }

    /// `Double` for `Some`, `Null` for `None`
    pub fn from_f64(value: Option<f64>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Double)
    }

    /// `Timestamp` for `Some`, `Null` for `None`
    pub fn from_timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Timestamp)
    }

    /// Short type label for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::BigInt(_) => "BIGINT",
            SqlValue::Double(_) => "DOUBLE",
            SqlValue::Varchar(_) => "VARCHAR",
            SqlValue::Timestamp(_) => "TIMESTAMP",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "null"),
            SqlValue::BigInt(v) => write!(f, "{v}"),
            SqlValue::Double(v) => write!(f, "{v}"),
            SqlValue::Varchar(v) => write!(f, "{v}"),
            SqlValue::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

/// A row type persisted to one partitioned table
pub trait Record: Sized {
    /// Table the rows are persisted to
    const TABLE: &'static str;

    /// Column schema, in storage order. The first column is always
    /// `partition_date`.
    const COLUMNS: &'static [Column];

    /// Partition the row belongs to
    fn partition_date(&self) -> &str;

    /// Values in [`Self::COLUMNS`] order
    fn to_values(&self) -> Vec<SqlValue>;

    /// Rebuild a row from values in [`Self::COLUMNS`] order
    fn from_values(values: Vec<SqlValue>) -> CoreResult<Self>;
}

/// Sequential typed reader over one row's values.
///
/// Used by [`Record::from_values`] implementations so decode errors carry
/// the table and column name.
pub struct RowReader {
    table: &'static str,
    columns: &'static [Column],
    values: std::vec::IntoIter<SqlValue>,
    index: usize,
}

impl RowReader {
    /// Start reading `values` for `R`, checking the arity first
    pub fn for_record<R: Record>(values: Vec<SqlValue>) -> CoreResult<Self> {
        if values.len() != R::COLUMNS.len() {
            return Err(CoreError::RecordDecode {
                table: R::TABLE.to_string(),
                message: format!(
                    "expected {} columns, found {}",
                    R::COLUMNS.len(),
                    values.len()
                ),
            });
        }
        Ok(Self {
            table: R::TABLE,
            columns: R::COLUMNS,
            values: values.into_iter(),
            index: 0,
        })
    }

    fn next_value(&mut self) -> CoreResult<(&'static str, SqlValue)> {
        let name = self.columns.get(self.index).map_or("?", |c| c.name);
        self.index += 1;
        let value = self.values.next().ok_or_else(|| CoreError::RecordDecode {
            table: self.table.to_string(),
            message: format!("missing value for column '{name}'"),
        })?;
        Ok((name, value))
    }

    fn mismatch(&self, column: &str, expected: &str, found: &SqlValue) -> CoreError {
        CoreError::RecordDecode {
            table: self.table.to_string(),
            message: format!(
                "column '{column}': expected {expected}, found {}",
                found.kind()
            ),
        }
    }

    /// Read a non-null text value
    pub fn text(&mut self) -> CoreResult<String> {
        match self.next_value()? {
            (_, SqlValue::Varchar(s)) => Ok(s),
            (name, other) => Err(self.mismatch(name, "VARCHAR", &other)),
        }
    }

    /// Read a non-null integer value
    pub fn bigint(&mut self) -> CoreResult<i64> {
        match self.next_value()? {
            (_, SqlValue::BigInt(v)) => Ok(v),
            (name, other) => Err(self.mismatch(name, "BIGINT", &other)),
        }
    }

    /// Read a nullable float value; integers widen
    pub fn opt_double(&mut self) -> CoreResult<Option<f64>> {
        match self.next_value()? {
            (_, SqlValue::Null) => Ok(None),
            (_, SqlValue::Double(v)) => Ok(Some(v)),
            (_, SqlValue::BigInt(v)) => Ok(Some(v as f64)),
            (name, other) => Err(self.mismatch(name, "DOUBLE", &other)),
        }
    }

    /// Read a non-null float value
    pub fn double(&mut self) -> CoreResult<f64> {
        let column = self.columns.get(self.index).map_or("?", |c| c.name);
        self.opt_double()?.ok_or_else(|| CoreError::RecordDecode {
            table: self.table.to_string(),
            message: format!("column '{column}' is NULL"),
        })
    }

    /// Read a nullable timestamp value
    pub fn opt_timestamp(&mut self) -> CoreResult<Option<DateTime<Utc>>> {
        match self.next_value()? {
            (_, SqlValue::Null) => Ok(None),
            (_, SqlValue::Timestamp(v)) => Ok(Some(v)),
            (name, other) => Err(self.mismatch(name, "TIMESTAMP", &other)),
        }
    }
}

/// Column names of a record type, in storage order
pub fn column_names<R: Record>() -> Vec<&'static str> {
    R::COLUMNS.iter().map(|c| c.name).collect()
}
