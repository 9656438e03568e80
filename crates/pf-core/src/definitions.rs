//! Registry of assets, jobs and schedules
//!
//! The pipeline's structure is declared here as data; the job runner and
//! the CLI read it instead of hard-coding stage order.

use crate::dag::AssetDag;
use crate::error::{CoreError, CoreResult};
use crate::freshness::FreshnessPolicy;
use crate::newtype_string::AssetKey;
use crate::partition::DailyPartitions;
use crate::prices::{CLEANED_PRICES_TABLE, DAILY_AGG_TABLE, RAW_PRICES_TABLE};
use crate::schedule::{ScheduleDefinition, DAILY_CRON};
use serde::Serialize;
use std::collections::HashMap;

pub const RAW_ASSET: &str = "raw_asset";
pub const CLEANED_ASSET: &str = "cleaned_asset";
pub const AGG_ASSET: &str = "agg_asset";

pub const RAW_ROW_COUNT_CHECK: &str = "raw_row_count_positive";
pub const CLEANED_ROW_COUNT_CHECK: &str = "cleaned_row_count_positive";
pub const CLEANED_NULL_THRESHOLD_CHECK: &str = "cleaned_null_threshold";
pub const AGG_ROW_COUNT_CHECK: &str = "agg_row_count_positive";

pub const DAILY_JOB: &str = "daily_job";
pub const DAILY_SCHEDULE: &str = "daily_schedule";

/// Declaration of one partitioned asset
#[derive(Debug, Clone, Serialize)]
pub struct AssetSpec {
    pub key: AssetKey,

    /// Table the asset persists into
    pub table: &'static str,

    /// Assets whose output this asset reads
    pub upstream: Vec<AssetKey>,

    /// Names of the checks evaluated after each materialization
    pub checks: Vec<&'static str>,

    pub freshness: FreshnessPolicy,

    pub description: &'static str,
}

/// A named selection of assets materialized together
#[derive(Debug, Clone, Serialize)]
pub struct JobDefinition {
    pub name: String,
    pub assets: Vec<AssetKey>,
}

/// Everything the pipeline knows about itself
#[derive(Debug, Clone, Serialize)]
pub struct Definitions {
    pub assets: Vec<AssetSpec>,
    pub jobs: Vec<JobDefinition>,
    pub schedules: Vec<ScheduleDefinition>,
    pub partitions: DailyPartitions,
}

fn asset_key(name: &str) -> CoreResult<AssetKey> {
    AssetKey::try_new(name).ok_or_else(|| CoreError::InvalidName {
        name: name.to_string(),
        context: "asset definition".to_string(),
    })
}

impl Definitions {
    /// The raw → cleaned → aggregated pipeline with its daily job and schedule
    pub fn standard() -> CoreResult<Self> {
        let freshness = FreshnessPolicy::default();
        let assets = vec![
            AssetSpec {
                key: asset_key(RAW_ASSET)?,
                table: RAW_PRICES_TABLE,
                upstream: Vec::new(),
                checks: vec![RAW_ROW_COUNT_CHECK],
                freshness,
                description: "Market snapshot for the partition, one row",
            },
            AssetSpec {
                key: asset_key(CLEANED_ASSET)?,
                table: CLEANED_PRICES_TABLE,
                upstream: vec![asset_key(RAW_ASSET)?],
                checks: vec![CLEANED_ROW_COUNT_CHECK, CLEANED_NULL_THRESHOLD_CHECK],
                freshness,
                description: "Raw rows with a parsed UTC timestamp",
            },
            AssetSpec {
                key: asset_key(AGG_ASSET)?,
                table: DAILY_AGG_TABLE,
                upstream: vec![asset_key(CLEANED_ASSET)?],
                checks: vec![AGG_ROW_COUNT_CHECK],
                freshness,
                description: "Daily price statistics and total volume",
            },
        ];
        let jobs = vec![JobDefinition {
            name: DAILY_JOB.to_string(),
            assets: assets.iter().map(|a| a.key.clone()).collect(),
        }];
        let schedules = vec![ScheduleDefinition::new(DAILY_SCHEDULE, DAILY_JOB, DAILY_CRON)?];

        let defs = Self {
            assets,
            jobs,
            schedules,
            partitions: DailyPartitions::standard(),
        };
        defs.dag()?;
        Ok(defs)
    }

    /// Build the dependency graph of the declared assets
    pub fn dag(&self) -> CoreResult<AssetDag> {
        let deps: HashMap<String, Vec<String>> = self
            .assets
            .iter()
            .map(|a| {
                (
                    a.key.to_string(),
                    a.upstream.iter().map(|u| u.to_string()).collect(),
                )
            })
            .collect();
        AssetDag::build(&deps)
    }

    /// Look up an asset by key
    pub fn asset(&self, key: &str) -> CoreResult<&AssetSpec> {
        self.assets
            .iter()
            .find(|a| a.key == key)
            .ok_or_else(|| CoreError::AssetNotFound {
                name: key.to_string(),
            })
    }

    /// Look up a job by name
    pub fn job(&self, name: &str) -> Option<&JobDefinition> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Look up a schedule by name
    pub fn schedule(&self, name: &str) -> Option<&ScheduleDefinition> {
        self.schedules.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
#[path = "definitions_test.rs"]
mod tests;
