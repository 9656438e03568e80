//! Market-data fetcher
//!
//! Returns one snapshot of BTC price, market cap and volume series, either
//! replayed from the sample payload or fetched live over HTTP.

use crate::error::{PipelineError, PipelineResult};
use chrono::Utc;
use pf_core::partition::PartitionKey;
use pf_core::prices::RawPrice;
use pf_core::settings::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Built-in copy of the sample payload, written by `pf init`
pub const SAMPLE_PAYLOAD: &str = include_str!("../fixtures/sample_api_payload.json");

/// Request timeout for live fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// `[timestamp_ms, value]`; the value may be JSON `null`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint(pub f64, pub Option<f64>);

impl DataPoint {
    /// Epoch milliseconds
    pub fn timestamp_ms(&self) -> i64 {
        self.0.round() as i64
    }

    pub fn value(&self) -> Option<f64> {
        self.1
    }
}

/// One market-data response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub prices: Vec<DataPoint>,
    pub market_caps: Vec<DataPoint>,
    pub total_volumes: Vec<DataPoint>,

    /// Stamped by the fetcher; any value in the payload is overwritten
    #[serde(default)]
    pub fetched_at: String,
}

impl MarketSnapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        serde_json::from_str(text).map_err(|e| PipelineError::Payload(e.to_string()))
    }

    /// Build the single raw row for `partition_key` from the first point of
    /// each series. The row's timestamp comes from the price series.
    pub fn first_row(&self, partition_key: PartitionKey) -> PipelineResult<RawPrice> {
        let first = |name: &str, series: &[DataPoint]| {
            series
                .first()
                .copied()
                .ok_or_else(|| PipelineError::Payload(format!("series '{}' is empty", name)))
        };
        let price = first("prices", &self.prices)?;
        let market_cap = first("market_caps", &self.market_caps)?;
        let volume = first("total_volumes", &self.total_volumes)?;

        Ok(RawPrice {
            partition_date: partition_key.to_string(),
            timestamp_ms: price.timestamp_ms(),
            price_usd: price.value(),
            market_cap_usd: market_cap.value(),
            volume_usd: volume.value(),
            fetched_at: self.fetched_at.clone(),
        })
    }
}

/// Read and parse the fixture at `path`
pub fn load_fixture(path: &Path) -> PipelineResult<MarketSnapshot> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Fixture {
        path: path.display().to_string(),
        source,
    })?;
    MarketSnapshot::from_json(&text)
}

/// Fetches market snapshots for a partition date
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    client: reqwest::Client,
    url: String,
    sample_payload: PathBuf,
}

impl MarketDataClient {
    /// Create a client for the endpoint and fixture named in `settings`
    pub fn new(settings: &Settings) -> PipelineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("priceflow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: settings.market_data_url.clone(),
            sample_payload: settings.sample_api_payload.clone(),
        })
    }

    /// Fetch the snapshot for `date`.
    ///
    /// Deterministic mode replays the fixture and stamps `fetched_at` with
    /// the partition's UTC midnight. Live mode performs one GET (no retry)
    /// and stamps the current time.
    pub async fn fetch(
        &self,
        date: PartitionKey,
        deterministic: bool,
    ) -> PipelineResult<MarketSnapshot> {
        if deterministic {
            let mut snapshot = load_fixture(&self.sample_payload)?;
            snapshot.fetched_at = date.start_utc().to_rfc3339();
            log::debug!(
                "Loaded sample payload {} for {}",
                self.sample_payload.display(),
                date
            );
            return Ok(snapshot);
        }

        log::info!("Fetching market data from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .query(&[("vs_currency", "usd"), ("days", "1"), ("interval", "daily")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::HttpStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let text = response.text().await?;
        let mut snapshot = MarketSnapshot::from_json(&text)?;
        snapshot.fetched_at = Utc::now().to_rfc3339();
        Ok(snapshot)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
