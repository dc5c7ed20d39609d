// =============================================================================
// Price History Provider — CoinGecko market chart
// =============================================================================
//
// The one source a prediction cannot run without. Fetches the daily price
// and volume series for a coin and keeps it for an hour; chart data moves
// slowly enough that anything fresher just burns the free-tier budget.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::cache::TtlCache;
use crate::monitor::UsageMonitor;

/// Price and volume series for one coin, most recent last.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
    pub current_price: f64,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    /// `[timestamp_ms, price]` pairs.
    prices: Vec<(f64, f64)>,
    #[serde(default)]
    total_volumes: Vec<(f64, f64)>,
}

/// Fetches and caches CoinGecko market chart data.
pub struct PriceHistoryProvider {
    client: reqwest::Client,
    cache: TtlCache<PriceHistory>,
    monitor: Arc<UsageMonitor>,
}

impl PriceHistoryProvider {
    pub fn new(
        client: reqwest::Client,
        ttl: Duration,
        capacity: usize,
        monitor: Arc<UsageMonitor>,
    ) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl, capacity),
            monitor,
        }
    }

    /// Fetch `days` of daily history for `coin_id`, serving from cache when
    /// fresh. An unknown coin surfaces as an error from the upstream 404.
    pub async fn fetch(&self, coin_id: &str, days: u32) -> Result<PriceHistory> {
        let cache_key = format!("{coin_id}_{days}");
        if let Some(history) = self.cache.get(&cache_key) {
            debug!(coin_id, days, "price history cache hit");
            return Ok(history);
        }

        self.monitor.record(&format!("coingecko-chart/{coin_id}"));

        let url = format!(
            "https://api.coingecko.com/api/v3/coins/{coin_id}/market_chart?vs_currency=usd&days={days}"
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET market chart for {coin_id}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse market chart response body")?;

        if !status.is_success() {
            anyhow::bail!("market chart API returned {}: {}", status, body);
        }

        let history = parse_chart(body)?;

        debug!(
            coin_id,
            days,
            points = history.prices.len(),
            current_price = history.current_price,
            "price history fetched"
        );

        self.cache.insert(cache_key, history.clone());
        Ok(history)
    }
}

/// Flatten the CoinGecko chart payload into bare series.
fn parse_chart(body: serde_json::Value) -> Result<PriceHistory> {
    let chart: ChartResponse =
        serde_json::from_value(body).context("unexpected market chart shape")?;

    let prices: Vec<f64> = chart.prices.iter().map(|(_, price)| *price).collect();
    let volumes: Vec<f64> = chart.total_volumes.iter().map(|(_, vol)| *vol).collect();

    let current_price = *prices
        .last()
        .context("market chart returned an empty price series")?;

    Ok(PriceHistory {
        prices,
        volumes,
        current_price,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chart_payload_is_flattened() {
        let body = json!({
            "prices": [[1_700_000_000_000i64, 42000.0], [1_700_086_400_000i64, 43500.5]],
            "total_volumes": [[1_700_000_000_000i64, 1.0e9], [1_700_086_400_000i64, 1.2e9]]
        });

        let history = parse_chart(body).unwrap();
        assert_eq!(history.prices, vec![42000.0, 43500.5]);
        assert_eq!(history.volumes, vec![1.0e9, 1.2e9]);
        assert_eq!(history.current_price, 43500.5);
    }

    #[test]
    fn missing_volumes_default_to_empty() {
        let body = json!({
            "prices": [[0i64, 10.0], [1i64, 11.0]]
        });

        let history = parse_chart(body).unwrap();
        assert_eq!(history.prices.len(), 2);
        assert!(history.volumes.is_empty());
        assert_eq!(history.current_price, 11.0);
    }

    #[test]
    fn empty_price_series_is_an_error() {
        let body = json!({ "prices": [], "total_volumes": [] });
        assert!(parse_chart(body).is_err());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let body = json!({ "prices": "not-an-array" });
        assert!(parse_chart(body).is_err());
    }
}
