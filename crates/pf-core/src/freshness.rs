//! Freshness policy for partitioned assets

use crate::partition::PartitionKey;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum lag: one day
pub const DEFAULT_MAXIMUM_LAG_MINUTES: u32 = 1440;

/// Defines when an asset should be considered stale.
///
/// The data time of a daily partition is the end of that day, so an asset
/// whose newest partition is yesterday is fresh for the whole of today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessPolicy {
    /// Maximum allowed minutes between the data time and now
    pub maximum_lag_minutes: u32,
}

impl FreshnessPolicy {
    /// Create a policy with the given maximum lag
    pub fn new(maximum_lag_minutes: u32) -> Self {
        Self {
            maximum_lag_minutes,
        }
    }

    /// Maximum lag as a duration
    pub fn maximum_lag(&self) -> Duration {
        Duration::minutes(i64::from(self.maximum_lag_minutes))
    }

    /// Evaluate freshness given the newest materialized partition
    pub fn evaluate(&self, latest: Option<PartitionKey>, now: DateTime<Utc>) -> FreshnessStatus {
        let Some(latest) = latest else {
            return FreshnessStatus::Missing;
        };
        let data_time = latest.end_utc();
        let lag_minutes = (now - data_time).num_minutes().max(0);
        if Duration::minutes(lag_minutes) > self.maximum_lag() {
            FreshnessStatus::Stale {
                latest,
                lag_minutes,
            }
        } else {
            FreshnessStatus::Fresh {
                latest,
                lag_minutes,
            }
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAXIMUM_LAG_MINUTES)
    }
}

/// Result of evaluating a freshness policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FreshnessStatus {
    /// Newest partition is within the allowed lag
    Fresh {
        latest: PartitionKey,
        lag_minutes: i64,
    },
    /// Newest partition is older than the allowed lag
    Stale {
        latest: PartitionKey,
        lag_minutes: i64,
    },
    /// No partition has been materialized
    Missing,
}

impl FreshnessStatus {
    /// Whether the asset is fresh
    pub fn is_fresh(&self) -> bool {
        matches!(self, FreshnessStatus::Fresh { .. })
    }

    /// Short status label
    pub fn label(&self) -> &'static str {
        match self {
            FreshnessStatus::Fresh { .. } => "fresh",
            FreshnessStatus::Stale { .. } => "stale",
            FreshnessStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for FreshnessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreshnessStatus::Fresh {
                latest,
                lag_minutes,
            }
            | FreshnessStatus::Stale {
                latest,
                lag_minutes,
            } => write!(
                f,
                "{} (latest {}, lag {}m)",
                self.label(),
                latest,
                lag_minutes
            ),
            FreshnessStatus::Missing => f.write_str("missing"),
        }
    }
}

#[cfg(test)]
#[path = "freshness_test.rs"]
mod tests;
