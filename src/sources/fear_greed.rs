// =============================================================================
// Fear & Greed Tracker — Alternative.me market-wide sentiment index
// =============================================================================
//
// The index is market-wide (one value for the whole crypto market, updated
// daily), so there is a single cache slot with an hour TTL. This source is
// deliberately unkillable: on upstream failure the tracker serves the last
// cached value however stale, and a neutral 50 if it has never succeeded.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::monitor::UsageMonitor;

const CACHE_KEY: &str = "global";

/// Latest Fear & Greed reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedSnapshot {
    /// Index value 0-100; low is fear.
    pub value: f64,
    /// Provider's label for the value ("Extreme Fear" .. "Extreme Greed").
    pub classification: String,
    /// Reading timestamp in ms.
    pub timestamp: i64,
    pub cached: bool,
    pub fetched_at: String,
}

impl FearGreedSnapshot {
    /// Mid-scale default for when the index has never been fetched.
    pub fn neutral() -> Self {
        Self {
            value: 50.0,
            classification: "Neutral".to_string(),
            timestamp: Utc::now().timestamp_millis(),
            cached: false,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Fetches the Alternative.me Fear & Greed index.
pub struct FearGreedTracker {
    client: reqwest::Client,
    cache: TtlCache<FearGreedSnapshot>,
    monitor: Arc<UsageMonitor>,
}

impl FearGreedTracker {
    pub fn new(client: reqwest::Client, ttl: Duration, monitor: Arc<UsageMonitor>) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl, 1),
            monitor,
        }
    }

    /// Current index reading. Never fails: falls back to the stale cache,
    /// then to a neutral default.
    pub async fn fetch(&self) -> FearGreedSnapshot {
        if let Some(mut snapshot) = self.cache.get(CACHE_KEY) {
            debug!("fear & greed cache hit");
            snapshot.cached = true;
            return snapshot;
        }

        match self.fetch_fresh().await {
            Ok(snapshot) => {
                self.cache.insert(CACHE_KEY, snapshot.clone());
                snapshot
            }
            Err(err) => {
                warn!(error = %err, "fear & greed fetch failed");
                if let Some(mut stale) = self.cache.get_stale(CACHE_KEY) {
                    warn!("serving stale fear & greed reading");
                    stale.cached = true;
                    return stale;
                }
                FearGreedSnapshot::neutral()
            }
        }
    }

    async fn fetch_fresh(&self) -> Result<FearGreedSnapshot> {
        self.monitor.record("alternative-fng");

        let resp = self
            .client
            .get("https://api.alternative.me/fng/?limit=1")
            .send()
            .await
            .context("GET fear & greed index")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse fear & greed response body")?;

        if !status.is_success() {
            anyhow::bail!("fear & greed API returned {}: {}", status, body);
        }

        let snapshot = parse_snapshot(&body)?;

        debug!(
            value = snapshot.value,
            classification = %snapshot.classification,
            "fear & greed fetched"
        );

        Ok(snapshot)
    }
}

fn parse_snapshot(body: &serde_json::Value) -> Result<FearGreedSnapshot> {
    let entry = body["data"]
        .as_array()
        .and_then(|arr| arr.first())
        .context("fear & greed response has no data")?;

    let value: f64 = entry["value"]
        .as_str()
        .unwrap_or("50")
        .parse()
        .unwrap_or(50.0);
    let classification = entry["value_classification"]
        .as_str()
        .unwrap_or("Neutral")
        .to_string();
    let timestamp: i64 = entry["timestamp"]
        .as_str()
        .unwrap_or("0")
        .parse()
        .unwrap_or(0);

    Ok(FearGreedSnapshot {
        value,
        classification,
        // The provider reports seconds.
        timestamp: timestamp * 1000,
        cached: false,
        fetched_at: Utc::now().to_rfc3339(),
    })
}
