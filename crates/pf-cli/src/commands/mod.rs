//! Command implementations

pub mod backfill;
pub(crate) mod common;
pub mod daemon;
pub mod freshness;
pub mod init;
pub mod ls;
pub mod materialize;
pub mod report;
pub mod validate;
