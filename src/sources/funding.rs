// =============================================================================
// Funding Rate Monitor — Binance perpetual funding as a contrarian signal
// =============================================================================
//
// Funding rates are the periodic payments that tether a perpetual contract
// to spot. Persistent positive funding means longs are paying to stay in,
// which reads contrarian-bearish at the extremes; deeply negative funding
// sets up a short squeeze. The ladder maps the eight-hour rate (as a
// percentage) onto a 0-100 score, bullish high:
//
//   > +0.10%  =>  Bearish, max(20, 50 - rate x 200)
//   > +0.05%  =>  Bearish, 35
//   > +0.01%  =>  Neutral, 45
//   > -0.01%  =>  Neutral, 50
//   > -0.05%  =>  Neutral, 55
//   > -0.10%  =>  Bullish, 65
//   below     =>  Bullish, min(80, 50 + |rate| x 200)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::TtlCache;
use crate::monitor::UsageMonitor;
use crate::sources::SymbolTable;
use crate::types::SourceSignal;

/// Funding payments settle every eight hours.
const FUNDING_INTERVAL_MS: i64 = 8 * 60 * 60 * 1000;

/// Classified funding state for one coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSnapshot {
    /// Funding rate in percent per interval, rounded to 4 decimals.
    pub rate: f64,
    pub signal: SourceSignal,
    /// 0-100, bullish high.
    pub score: f64,
    pub interpretation: String,
    /// Rate as the raw decimal the exchange reports.
    pub raw_rate: f64,
    /// Yearly equivalent in percent (three settlements a day).
    pub annualized_rate: f64,
    /// Timestamp (ms) of the next settlement.
    pub next_funding_time: i64,
    pub cached: bool,
    pub fetched_at: String,
}

impl FundingSnapshot {
    /// Payload for coins with no perpetual contract.
    pub fn no_contract() -> Self {
        Self {
            rate: 0.0,
            signal: SourceSignal::Neutral,
            score: 50.0,
            interpretation: "No futures contract available".to_string(),
            raw_rate: 0.0,
            annualized_rate: 0.0,
            next_funding_time: 0,
            cached: false,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Fetches and classifies Binance perpetual funding rates.
pub struct FundingRateMonitor {
    client: reqwest::Client,
    cache: TtlCache<FundingSnapshot>,
    monitor: Arc<UsageMonitor>,
    symbols: Arc<SymbolTable>,
}

impl FundingRateMonitor {
    pub fn new(
        client: reqwest::Client,
        ttl: Duration,
        capacity: usize,
        symbols: Arc<SymbolTable>,
        monitor: Arc<UsageMonitor>,
    ) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl, capacity),
            monitor,
            symbols,
        }
    }

    /// Fetch the latest funding rate for `coin_id`, serving from cache when
    /// fresh. Coins without a futures contract get a neutral payload.
    pub async fn fetch(&self, coin_id: &str) -> Result<FundingSnapshot> {
        if let Some(mut snapshot) = self.cache.get(coin_id) {
            debug!(coin_id, "funding rate cache hit");
            snapshot.cached = true;
            return Ok(snapshot);
        }

        let Some(symbol) = self.symbols.futures_symbol(coin_id) else {
            debug!(coin_id, "no futures contract, serving neutral funding");
            return Ok(FundingSnapshot::no_contract());
        };

        self.monitor.record(&format!("binance-funding/{coin_id}"));

        let url = format!(
            "https://fapi.binance.com/fapi/v1/fundingRate?symbol={symbol}&limit=1"
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET funding rate for {coin_id}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse funding rate response body")?;

        if !status.is_success() {
            anyhow::bail!("funding rate API returned {}: {}", status, body);
        }

        let arr = body
            .as_array()
            .context("funding rate response is not an array")?;
        let entry = arr
            .first()
            .context("funding rate response array is empty")?;

        let raw_rate: f64 = entry["fundingRate"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .unwrap_or(0.0);
        let funding_time = entry["fundingTime"].as_i64().unwrap_or(0);

        let snapshot = build_snapshot(raw_rate, funding_time);

        debug!(
            coin_id,
            symbol,
            rate = format!("{:.4}", snapshot.rate),
            score = snapshot.score,
            signal = %snapshot.signal,
            "funding rate fetched"
        );

        self.cache.insert(coin_id, snapshot.clone());
        Ok(snapshot)
    }
}

/// Walk the contrarian ladder for a rate already converted to percent.
fn classify(rate_pct: f64) -> (SourceSignal, f64, &'static str) {
    if rate_pct > 0.10 {
        (
            SourceSignal::Bearish,
            (50.0 - rate_pct * 200.0).max(20.0),
            "Extremely high funding rate suggests overleveraged longs, potential for downward correction",
        )
    } else if rate_pct > 0.05 {
        (
            SourceSignal::Bearish,
            35.0,
            "High funding rate indicates bullish sentiment may be overextended",
        )
    } else if rate_pct > 0.01 {
        (
            SourceSignal::Neutral,
            45.0,
            "Moderate positive funding shows healthy bullish sentiment",
        )
    } else if rate_pct > -0.01 {
        (
            SourceSignal::Neutral,
            50.0,
            "Balanced funding rate indicates neutral market sentiment",
        )
    } else if rate_pct > -0.05 {
        (
            SourceSignal::Neutral,
            55.0,
            "Moderate negative funding shows healthy bearish sentiment",
        )
    } else if rate_pct > -0.10 {
        (
            SourceSignal::Bullish,
            65.0,
            "High negative funding rate indicates potential for upward correction",
        )
    } else {
        (
            SourceSignal::Bullish,
            (50.0 + rate_pct.abs() * 200.0).min(80.0),
            "Extremely negative funding rate suggests overleveraged shorts, potential for short squeeze",
        )
    }
}

fn build_snapshot(raw_rate: f64, funding_time_ms: i64) -> FundingSnapshot {
    let rate_pct = raw_rate * 100.0;
    let annualized = raw_rate * 3.0 * 365.0 * 100.0;
    let (signal, score, interpretation) = classify(rate_pct);

    FundingSnapshot {
        rate: (rate_pct * 10_000.0).round() / 10_000.0,
        signal,
        score: score.round(),
        interpretation: interpretation.to_string(),
        raw_rate,
        annualized_rate: (annualized * 100.0).round() / 100.0,
        next_funding_time: funding_time_ms + FUNDING_INTERVAL_MS,
        cached: false,
        fetched_at: Utc::now().to_rfc3339(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- classify ----

    #[test]
    fn extreme_positive_funding_is_bearish_and_floored() {
        let (signal, score, _) = classify(0.15);
        assert_eq!(signal, SourceSignal::Bearish);
        assert_eq!(score, 20.0);

        // Deep enough that the raw formula would go below the floor.
        let (_, score, _) = classify(0.5);
        assert_eq!(score, 20.0);
    }

    #[test]
    fn ladder_covers_the_middle_rungs() {
        assert_eq!(classify(0.08).1, 35.0);
        assert_eq!(classify(0.03).1, 45.0);
        assert_eq!(classify(0.0).1, 50.0);
        assert_eq!(classify(-0.03).1, 55.0);
        assert_eq!(classify(-0.08).1, 65.0);

        assert_eq!(classify(0.03).0, SourceSignal::Neutral);
        assert_eq!(classify(-0.08).0, SourceSignal::Bullish);
    }

    #[test]
    fn extreme_negative_funding_is_bullish_and_capped() {
        // 50 + 0.12 * 200 = 74, under the cap.
        let (signal, score, _) = classify(-0.12);
        assert_eq!(signal, SourceSignal::Bullish);
        assert_eq!(score, 74.0);

        let (_, score, _) = classify(-0.5);
        assert_eq!(score, 80.0);
    }

    #[test]
    fn rung_boundaries_are_exclusive() {
        // Exactly 0.10 does not reach the extreme rung.
        assert_eq!(classify(0.10).1, 35.0);
        assert_eq!(classify(0.05).1, 45.0);
        assert_eq!(classify(-0.10).1, (50.0f64 + 0.10 * 200.0).min(80.0));
    }

    // ---- build_snapshot ----

    #[test]
    fn snapshot_rounds_and_annualizes() {
        let snapshot = build_snapshot(0.000123456, 1_000);

        // 0.0123456% rounds to 0.0123; annualized 0.000123456 * 3 * 365 * 100.
        assert_eq!(snapshot.rate, 0.0123);
        assert_eq!(snapshot.annualized_rate, 13.52);
        assert_eq!(snapshot.score, 45.0);
        assert_eq!(snapshot.signal, SourceSignal::Neutral);
        assert_eq!(snapshot.next_funding_time, 1_000 + FUNDING_INTERVAL_MS);
        assert!(!snapshot.cached);
    }

    #[test]
    fn no_contract_payload_is_neutral() {
        let snapshot = FundingSnapshot::no_contract();
        assert_eq!(snapshot.score, 50.0);
        assert_eq!(snapshot.signal, SourceSignal::Neutral);
        assert_eq!(snapshot.interpretation, "No futures contract available");
        assert_eq!(snapshot.next_funding_time, 0);
    }
}
