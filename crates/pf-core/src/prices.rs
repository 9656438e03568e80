//! Row types for the three pipeline tables and the pure transforms between them

use crate::error::CoreResult;
use crate::record::{Column, ColumnType, Record, RowReader, SqlValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Table written by the raw stage
pub const RAW_PRICES_TABLE: &str = "raw_prices";
/// Table written by the cleaned stage
pub const CLEANED_PRICES_TABLE: &str = "cleaned_prices";
/// Table written by the aggregated stage
pub const DAILY_AGG_TABLE: &str = "daily_agg";

/// One market data point as fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrice {
    pub partition_date: String,
    pub timestamp_ms: i64,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_usd: Option<f64>,
    pub fetched_at: String,
}

/// A raw point with its epoch milliseconds turned into a timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedPrice {
    pub partition_date: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume_usd: Option<f64>,
    pub fetched_at: String,
}

/// Per-partition price statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAgg {
    pub partition_date: String,
    pub avg_price_usd: Option<f64>,
    pub max_price_usd: Option<f64>,
    pub min_price_usd: Option<f64>,
    pub total_volume_usd: f64,
}

impl Record for RawPrice {
    const TABLE: &'static str = RAW_PRICES_TABLE;
    const COLUMNS: &'static [Column] = &[
        Column::new("partition_date", ColumnType::Varchar),
        Column::new("timestamp_ms", ColumnType::BigInt),
        Column::new("price_usd", ColumnType::Double),
        Column::new("market_cap_usd", ColumnType::Double),
        Column::new("volume_usd", ColumnType::Double),
        Column::new("fetched_at", ColumnType::Varchar),
    ];

    fn partition_date(&self) -> &str {
        &self.partition_date
    }

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Varchar(self.partition_date.clone()),
            SqlValue::BigInt(self.timestamp_ms),
            SqlValue::from_f64(self.price_usd),
            SqlValue::from_f64(self.market_cap_usd),
            SqlValue::from_f64(self.volume_usd),
            SqlValue::Varchar(self.fetched_at.clone()),
        ]
    }

    fn from_values(values: Vec<SqlValue>) -> CoreResult<Self> {
        let mut r = RowReader::for_record::<Self>(values)?;
        Ok(Self {
            partition_date: r.text()?,
            timestamp_ms: r.bigint()?,
            price_usd: r.opt_double()?,
            market_cap_usd: r.opt_double()?,
            volume_usd: r.opt_double()?,
            fetched_at: r.text()?,
        })
    }
}

impl Record for CleanedPrice {
    const TABLE: &'static str = CLEANED_PRICES_TABLE;
    const COLUMNS: &'static [Column] = &[
        Column::new("partition_date", ColumnType::Varchar),
        Column::new("timestamp", ColumnType::Timestamp),
        Column::new("price_usd", ColumnType::Double),
        Column::new("market_cap_usd", ColumnType::Double),
        Column::new("volume_usd", ColumnType::Double),
        Column::new("fetched_at", ColumnType::Varchar),
    ];

    fn partition_date(&self) -> &str {
        &self.partition_date
    }

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Varchar(self.partition_date.clone()),
            SqlValue::from_timestamp(self.timestamp),
            SqlValue::from_f64(self.price_usd),
            SqlValue::from_f64(self.market_cap_usd),
            SqlValue::from_f64(self.volume_usd),
            SqlValue::Varchar(self.fetched_at.clone()),
        ]
    }

    fn from_values(values: Vec<SqlValue>) -> CoreResult<Self> {
        let mut r = RowReader::for_record::<Self>(values)?;
        Ok(Self {
            partition_date: r.text()?,
            timestamp: r.opt_timestamp()?,
            price_usd: r.opt_double()?,
            market_cap_usd: r.opt_double()?,
            volume_usd: r.opt_double()?,
            fetched_at: r.text()?,
        })
    }
}

impl Record for DailyAgg {
    const TABLE: &'static str = DAILY_AGG_TABLE;
    const COLUMNS: &'static [Column] = &[
        Column::new("partition_date", ColumnType::Varchar),
        Column::new("avg_price_usd", ColumnType::Double),
        Column::new("max_price_usd", ColumnType::Double),
        Column::new("min_price_usd", ColumnType::Double),
        Column::new("total_volume_usd", ColumnType::Double),
    ];

    fn partition_date(&self) -> &str {
        &self.partition_date
    }

    fn to_values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Varchar(self.partition_date.clone()),
            SqlValue::from_f64(self.avg_price_usd),
            SqlValue::from_f64(self.max_price_usd),
            SqlValue::from_f64(self.min_price_usd),
            SqlValue::Double(self.total_volume_usd),
        ]
    }

    fn from_values(values: Vec<SqlValue>) -> CoreResult<Self> {
        let mut r = RowReader::for_record::<Self>(values)?;
        Ok(Self {
            partition_date: r.text()?,
            avg_price_usd: r.opt_double()?,
            max_price_usd: r.opt_double()?,
            min_price_usd: r.opt_double()?,
            total_volume_usd: r.double()?,
        })
    }
}

/// Convert raw points to cleaned rows.
///
/// A `timestamp_ms` outside chrono's representable range yields a missing
/// timestamp rather than an error, so the null-ratio check can flag it.
pub fn clean(raw: &[RawPrice]) -> Vec<CleanedPrice> {
    raw.iter()
        .map(|row| CleanedPrice {
            partition_date: row.partition_date.clone(),
            timestamp: DateTime::from_timestamp_millis(row.timestamp_ms),
            price_usd: row.price_usd,
            market_cap_usd: row.market_cap_usd,
            volume_usd: row.volume_usd,
            fetched_at: row.fetched_at.clone(),
        })
        .collect()
}

#[derive(Default)]
struct PriceAccumulator {
    price_sum: f64,
    price_count: usize,
    max: Option<f64>,
    min: Option<f64>,
    volume_sum: f64,
}

impl PriceAccumulator {
    fn push(&mut self, row: &CleanedPrice) {
        if let Some(price) = row.price_usd.filter(|p| !p.is_nan()) {
            self.price_sum += price;
            self.price_count += 1;
            self.max = Some(self.max.map_or(price, |m| m.max(price)));
            self.min = Some(self.min.map_or(price, |m| m.min(price)));
        }
        if let Some(volume) = row.volume_usd.filter(|v| !v.is_nan()) {
            self.volume_sum += volume;
        }
    }

    fn finish(self, partition_date: String) -> DailyAgg {
        DailyAgg {
            partition_date,
            avg_price_usd: (self.price_count > 0)
                .then(|| self.price_sum / self.price_count as f64),
            max_price_usd: self.max,
            min_price_usd: self.min,
            total_volume_usd: self.volume_sum,
        }
    }
}

/// Group cleaned rows by partition date and compute price statistics.
///
/// Output is ordered by partition date. Missing prices and volumes are
/// skipped; a group with no prices has missing mean/max/min.
pub fn aggregate(cleaned: &[CleanedPrice]) -> Vec<DailyAgg> {
    let mut groups: BTreeMap<&str, PriceAccumulator> = BTreeMap::new();
    for row in cleaned {
        groups
            .entry(row.partition_date.as_str())
            .or_default()
            .push(row);
    }
    groups
        .into_iter()
        .map(|(date, acc)| acc.finish(date.to_string()))
        .collect()
}

#[cfg(test)]
#[path = "prices_test.rs"]
mod tests;
