// =============================================================================
// Market Metrics Monitor — Binance top-trader positioning
// =============================================================================
//
// Reads the top-trader long/short position ratio for a coin's perpetual and
// grades how crowded the trade is. Crowding is contrarian: a ratio past 2 or
// 3 means longs stacked on one side of the boat and liquidation cascades
// below; a ratio under 0.5 means shorts are the crowd and squeezes resolve
// upward. The 24h quote volume rides along for presentation.
//
//   ratio > 3.0   =>  Bearish 20, extreme long crowding
//   ratio > 2.0   =>  Bearish 30
//   ratio > 1.5   =>  Bearish 40
//   ratio > 1.2   =>  Neutral 45, mild long bias
//   ratio >= 0.8  =>  Neutral 50, balanced
//   ratio >= 0.7  =>  Neutral 55, mild short bias
//   ratio >= 0.5  =>  Bullish 60
//   ratio >= 0.33 =>  Bullish 70
//   below         =>  Bullish 80, extreme short crowding

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::TtlCache;
use crate::monitor::UsageMonitor;
use crate::sources::SymbolTable;
use crate::types::{PositioningSentiment, SourceSignal};

/// Classified positioning state for one coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Long/short position ratio, rounded to 3 decimals.
    pub long_short_ratio: f64,
    pub signal: SourceSignal,
    /// 0-100, bullish high.
    pub score: f64,
    pub interpretation: String,
    /// Long account share as the exchange reports it, rounded to 2 decimals.
    pub long_account_percent: f64,
    /// Short account share as the exchange reports it, rounded to 2 decimals.
    pub short_account_percent: f64,
    /// 24h quote volume, rounded to whole units. Zero when unavailable.
    pub volume_24h: f64,
    pub sentiment: PositioningSentiment,
    pub cached: bool,
    pub fetched_at: String,
}

impl MarketSnapshot {
    /// Payload for coins with no perpetual contract.
    pub fn no_contract() -> Self {
        Self {
            long_short_ratio: 1.0,
            signal: SourceSignal::Neutral,
            score: 50.0,
            interpretation: "No futures contract available".to_string(),
            long_account_percent: 50.0,
            short_account_percent: 50.0,
            volume_24h: 0.0,
            sentiment: PositioningSentiment::Balanced,
            cached: false,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Fetches and classifies Binance top-trader positioning.
pub struct MarketMetricsMonitor {
    client: reqwest::Client,
    cache: TtlCache<MarketSnapshot>,
    monitor: Arc<UsageMonitor>,
    symbols: Arc<SymbolTable>,
}

impl MarketMetricsMonitor {
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

    /// Fetch the latest positioning metrics for `coin_id`, serving from
    /// cache when fresh. Coins without a futures contract get a neutral
    /// payload; a failed volume lookup degrades to zero rather than failing
    /// the whole snapshot.
    pub async fn fetch(&self, coin_id: &str) -> Result<MarketSnapshot> {
        if let Some(mut snapshot) = self.cache.get(coin_id) {
            debug!(coin_id, "market metrics cache hit");
            snapshot.cached = true;
            return Ok(snapshot);
        }

        let Some(symbol) = self.symbols.futures_symbol(coin_id) else {
            debug!(coin_id, "no futures contract, serving neutral metrics");
            return Ok(MarketSnapshot::no_contract());
        };
        let symbol = symbol.to_string();

        self.monitor.record(&format!("binance-metrics/{coin_id}"));

        let ratio_url = format!(
            "https://fapi.binance.com/futures/data/topLongShortPositionRatio?symbol={symbol}&period=5m&limit=1"
        );
        let resp = self
            .client
            .get(&ratio_url)
            .send()
            .await
            .with_context(|| format!("GET long/short ratio for {coin_id}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse long/short ratio response body")?;

        if !status.is_success() {
            anyhow::bail!("long/short ratio API returned {}: {}", status, body);
        }

        let arr = body
            .as_array()
            .context("long/short ratio response is not an array")?;
        let entry = arr
            .first()
            .context("long/short ratio response array is empty")?;

        let ratio: f64 = entry["longShortRatio"]
            .as_str()
            .unwrap_or("1.0")
            .parse()
            .unwrap_or(1.0);
        let long_share: f64 = entry["longAccount"]
            .as_str()
            .unwrap_or("0.5")
            .parse()
            .unwrap_or(0.5);
        let short_share: f64 = entry["shortAccount"]
            .as_str()
            .unwrap_or("0.5")
            .parse()
            .unwrap_or(0.5);

        let volume_24h = self.fetch_volume(&symbol).await;

        let snapshot = build_snapshot(ratio, long_share, short_share, volume_24h);

        debug!(
            coin_id,
            symbol,
            ratio = format!("{:.3}", snapshot.long_short_ratio),
            score = snapshot.score,
            signal = %snapshot.signal,
            sentiment = %snapshot.sentiment,
            "market metrics fetched"
        );

        self.cache.insert(coin_id, snapshot.clone());
        Ok(snapshot)
    }

    /// 24h quote volume, or zero if the stats call fails.
    async fn fetch_volume(&self, symbol: &str) -> f64 {
        let url = format!("https://fapi.binance.com/fapi/v1/ticker/24hr?symbol={symbol}");
        let resp = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            _ => return 0.0,
        };
        let body: serde_json::Value = match resp.json().await {
            Ok(body) => body,
            Err(_) => return 0.0,
        };
        body["quoteVolume"]
            .as_str()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }
}

/// Grade the crowding of the long/short ratio.
fn classify(ratio: f64) -> (SourceSignal, f64, PositioningSentiment, &'static str) {
    if ratio > 3.0 {
        (
            SourceSignal::Bearish,
            20.0,
            PositioningSentiment::ExtremeLong,
            "Extremely high long/short ratio (>3.0) indicates overcrowded longs, high liquidation risk on downside",
        )
    } else if ratio > 2.0 {
        (
            SourceSignal::Bearish,
            30.0,
            PositioningSentiment::ExtremeLong,
            "Very high long/short ratio (>2.0) suggests market is overextended to the long side",
        )
    } else if ratio > 1.5 {
        (
            SourceSignal::Bearish,
            40.0,
            PositioningSentiment::LongBias,
            "High long bias may lead to downward pressure if longs get liquidated",
        )
    } else if ratio > 1.2 {
        (
            SourceSignal::Neutral,
            45.0,
            PositioningSentiment::LongBias,
            "Moderate long bias, generally healthy for uptrends",
        )
    } else if ratio >= 0.8 {
        (
            SourceSignal::Neutral,
            50.0,
            PositioningSentiment::Balanced,
            "Balanced long/short ratio indicates healthy market equilibrium",
        )
    } else if ratio >= 0.7 {
        (
            SourceSignal::Neutral,
            55.0,
            PositioningSentiment::ShortBias,
            "Moderate short bias, generally healthy for downtrends",
        )
    } else if ratio >= 0.5 {
        (
            SourceSignal::Bullish,
            60.0,
            PositioningSentiment::ShortBias,
            "High short bias creates potential for short squeeze upward",
        )
    } else if ratio >= 0.33 {
        (
            SourceSignal::Bullish,
            70.0,
            PositioningSentiment::ExtremeShort,
            "Very high short/long ratio (<0.5) suggests overcrowded shorts, potential for sharp rally",
        )
    } else {
        (
            SourceSignal::Bullish,
            80.0,
            PositioningSentiment::ExtremeShort,
            "Extremely low long/short ratio (<0.33) indicates extreme short positioning, high short squeeze potential",
        )
    }
}

fn build_snapshot(ratio: f64, long_share: f64, short_share: f64, volume_24h: f64) -> MarketSnapshot {
    let (signal, score, sentiment, interpretation) = classify(ratio);

    MarketSnapshot {
        long_short_ratio: (ratio * 1_000.0).round() / 1_000.0,
        signal,
        score: score.round(),
        interpretation: interpretation.to_string(),
        long_account_percent: (long_share * 100.0).round() / 100.0,
        short_account_percent: (short_share * 100.0).round() / 100.0,
        volume_24h: volume_24h.round(),
        sentiment,
        cached: false,
        fetched_at: Utc::now().to_rfc3339(),
    }
}
