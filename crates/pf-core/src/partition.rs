//! Daily partition keys and the partition set they belong to

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Format of a partition key (`YYYY-MM-DD`)
pub const PARTITION_FORMAT: &str = "%Y-%m-%d";

/// First partition of the standard daily partition set
pub const DEFAULT_START_DATE: &str = "2024-01-01";

/// A calendar date identifying one unit of pipeline work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey(NaiveDate);

impl PartitionKey {
    /// Parse a `YYYY-MM-DD` key.
    pub fn parse(key: &str) -> CoreResult<Self> {
        let trimmed = key.trim();
        if trimmed.len() != 10 {
            return Err(CoreError::InvalidPartitionKey {
                key: key.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            });
        }
        NaiveDate::parse_from_str(trimmed, PARTITION_FORMAT)
            .map(Self)
            .map_err(|e| CoreError::InvalidPartitionKey {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Wrap a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The calendar date of this partition
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// UTC midnight at the start of the partition
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// UTC midnight at the end of the partition (start of the next day)
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.next().start_utc()
    }

    /// The following day's partition
    pub fn next(&self) -> Self {
        Self(self.0.checked_add_days(Days::new(1)).unwrap_or(self.0))
    }

    /// The preceding day's partition
    pub fn previous(&self) -> Self {
        Self(self.0.checked_sub_days(Days::new(1)).unwrap_or(self.0))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PARTITION_FORMAT))
    }
}

impl FromStr for PartitionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PartitionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Daily partition set starting at a fixed date.
///
/// A day becomes a valid partition once it has ended, so the set on a given
/// `today` is `[start_date, today)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPartitions {
    start_date: NaiveDate,
}

impl DailyPartitions {
    /// Create a partition set starting at `start_date`
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    /// The partition set used by the pipeline (starts 2024-01-01)
    pub fn standard() -> Self {
        let start = NaiveDate::parse_from_str(DEFAULT_START_DATE, PARTITION_FORMAT)
            .unwrap_or(NaiveDate::MIN);
        Self::new(start)
    }

    /// First partition in the set
    pub fn start(&self) -> PartitionKey {
        PartitionKey(self.start_date)
    }

    /// Whether `key` is a complete partition as of `today`
    pub fn contains(&self, key: PartitionKey, today: NaiveDate) -> bool {
        key.date() >= self.start_date && key.date() < today
    }

    /// Fail with [`CoreError::PartitionOutOfRange`] unless `key` is in the set
    pub fn validate(&self, key: PartitionKey, today: NaiveDate) -> CoreResult<()> {
        if self.contains(key, today) {
            Ok(())
        } else {
            Err(CoreError::PartitionOutOfRange {
                key: key.to_string(),
                start: self.start().to_string(),
                end: PartitionKey(today).to_string(),
            })
        }
    }

    /// Most recent complete partition as of `today`
    pub fn last_complete(&self, today: NaiveDate) -> Option<PartitionKey> {
        let candidate = PartitionKey(today).previous();
        self.contains(candidate, today).then_some(candidate)
    }

    /// Every partition from `first` to `last`, inclusive
    pub fn keys_between(
        &self,
        first: PartitionKey,
        last: PartitionKey,
        today: NaiveDate,
    ) -> CoreResult<Vec<PartitionKey>> {
        if first > last {
            return Err(CoreError::InvalidPartitionKey {
                key: first.to_string(),
                reason: format!("range start is after range end {}", last),
            });
        }
        self.validate(first, today)?;
        self.validate(last, today)?;

        let mut keys = Vec::new();
        let mut current = first;
        while current <= last {
            keys.push(current);
            current = current.next();
        }
        Ok(keys)
    }
}

impl Default for DailyPartitions {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "partition_test.rs"]
mod tests;
