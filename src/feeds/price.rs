//! Spot-price history feed for the ZEC price chart.

use crate::source::SourceUnavailable;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/coins/zcash";

/// The feed returns hourly points over the lookback window; keeping every
/// 24th gives roughly one per day, which is all the chart needs.
pub const DAILY_SUBSAMPLE_STEP: usize = 24;

/// One timestamped spot price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(i64, f64)>,
}

/// Read-only client for the market-chart endpoint.
pub struct PriceFeed {
    client: reqwest::Client,
    base_url: String,
}

impl PriceFeed {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetches `days` of price history, subsampled to one point per day.
    pub async fn history(&self, days: u32) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/market_chart?vs_currency=usd&days={days}",
            self.base_url
        );
        trace!("fetching price history from {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(SourceUnavailable(format!(
                "price feed returned HTTP {}",
                response.status()
            ))
            .into());
        }
        let chart: MarketChart = response
            .json()
            .await
            .map_err(|e| SourceUnavailable(e.to_string()))?;

        let points = chart
            .prices
            .into_iter()
            .filter_map(|(millis, price)| {
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(|time| PricePoint { time, price })
            })
            .collect();
        Ok(subsample(points, DAILY_SUBSAMPLE_STEP))
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps every `step`-th point, starting with the first.
pub fn subsample(points: Vec<PricePoint>, step: usize) -> Vec<PricePoint> {
    if step <= 1 {
        return points;
    }
    points
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0)
        .map(|(_, p)| p)
        .collect()
}
