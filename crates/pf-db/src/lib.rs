//! pf-db - Storage layer for Priceflow
//!
//! This crate provides the `Database` trait, its DuckDB implementation, and
//! typed helpers that persist partitioned [`pf_core::Record`] rows with
//! delete-then-insert semantics.

pub mod duckdb;
pub mod error;
pub mod records;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use records::{ensure_table, read_partition, write_partition};
pub use traits::{Database, Row};
