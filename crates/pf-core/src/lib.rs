//! pf-core - Core library for Priceflow
//!
//! Shared types for the daily market-data pipeline: settings, partition
//! keys, row records and their stage transforms, stage checks, the asset
//! DAG, freshness and schedule policies, and the definitions registry.

pub mod checks;
pub mod dag;
pub mod definitions;
pub mod error;
pub mod freshness;
mod newtype_string;
pub mod partition;
pub mod prices;
pub mod record;
pub mod schedule;
pub mod settings;
pub mod sql_utils;

pub use checks::{AssetCheckResult, DEFAULT_NULL_RATIO_THRESHOLD};
pub use dag::AssetDag;
pub use definitions::{AssetSpec, Definitions, JobDefinition};
pub use error::{CoreError, CoreResult};
pub use freshness::{FreshnessPolicy, FreshnessStatus};
pub use newtype_string::AssetKey;
pub use partition::{DailyPartitions, PartitionKey};
pub use prices::{CleanedPrice, DailyAgg, RawPrice};
pub use record::{Column, ColumnType, Record, SqlValue};
pub use schedule::{CronSchedule, ScheduleDefinition};
pub use settings::Settings;
