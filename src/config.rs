// =============================================================================
// Engine Configuration — JSON-backed settings with atomic save
// =============================================================================
//
// Everything an operator may want to tune without a rebuild: the bind
// address, prediction defaults, cache freshness windows, source weights and
// extra coin listings. Persistence uses the tmp + rename pattern so a crash
// mid-write never leaves a torn file, and every field carries a serde
// default so older config files keep loading as fields are added.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::prediction::SourceWeights;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3010".to_string()
}

fn default_days() -> u32 {
    7
}

fn default_history_days() -> u32 {
    90
}

fn default_cache_capacity() -> usize {
    100
}

fn default_news_ttl_secs() -> u64 {
    10 * 60
}

fn default_funding_ttl_secs() -> u64 {
    5 * 60
}

fn default_market_ttl_secs() -> u64 {
    5 * 60
}

fn default_fear_greed_ttl_secs() -> u64 {
    60 * 60
}

fn default_prices_ttl_secs() -> u64 {
    60 * 60
}

// =============================================================================
// CacheTtls
// =============================================================================

/// Per-source cache freshness windows, in seconds. Defaults are tuned to the
/// providers' free-tier budgets and update cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtls {
    #[serde(default = "default_news_ttl_secs")]
    pub news_secs: u64,

    #[serde(default = "default_funding_ttl_secs")]
    pub funding_secs: u64,

    #[serde(default = "default_market_ttl_secs")]
    pub market_secs: u64,

    /// The index updates once a day; an hour is already generous.
    #[serde(default = "default_fear_greed_ttl_secs")]
    pub fear_greed_secs: u64,

    #[serde(default = "default_prices_ttl_secs")]
    pub prices_secs: u64,
}

impl CacheTtls {
    pub fn news(&self) -> Duration {
        Duration::from_secs(self.news_secs)
    }

    pub fn funding(&self) -> Duration {
        Duration::from_secs(self.funding_secs)
    }

    pub fn market(&self) -> Duration {
        Duration::from_secs(self.market_secs)
    }

    pub fn fear_greed(&self) -> Duration {
        Duration::from_secs(self.fear_greed_secs)
    }

    pub fn prices(&self) -> Duration {
        Duration::from_secs(self.prices_secs)
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            news_secs: default_news_ttl_secs(),
            funding_secs: default_funding_ttl_secs(),
            market_secs: default_market_ttl_secs(),
            fear_greed_secs: default_fear_greed_ttl_secs(),
            prices_secs: default_prices_ttl_secs(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the scoring engine and its REST surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Prediction horizon used when the request does not name one.
    #[serde(default = "default_days")]
    pub default_days: u32,

    /// Days of price history fed to the indicators, independent of the
    /// requested horizon.
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Entry bound for the per-coin provider caches.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default)]
    pub cache_ttls: CacheTtls,

    /// Nominal per-source prediction weights.
    #[serde(default)]
    pub weights: SourceWeights,

    /// Extra coin-id to futures-symbol listings layered over the built-in
    /// table, e.g. `{"sui": "SUIUSDT"}`.
    #[serde(default)]
    pub extra_symbols: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            default_days: default_days(),
            history_days: default_history_days(),
            cache_capacity: default_cache_capacity(),
            cache_ttls: CacheTtls::default(),
            weights: SourceWeights::default(),
            extra_symbols: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            default_days = config.default_days,
            history_days = config.history_days,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` atomically (write to `.tmp`,
    /// then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3010");
        assert_eq!(cfg.default_days, 7);
        assert_eq!(cfg.history_days, 90);
        assert_eq!(cfg.cache_capacity, 100);
        assert_eq!(cfg.cache_ttls.news_secs, 600);
        assert_eq!(cfg.cache_ttls.funding_secs, 300);
        assert_eq!(cfg.cache_ttls.fear_greed_secs, 3600);
        assert!((cfg.weights.technical - 0.35).abs() < f64::EPSILON);
        assert!((cfg.weights.news - 0.25).abs() < f64::EPSILON);
        assert!(cfg.extra_symbols.is_empty());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3010");
        assert_eq!(cfg.default_days, 7);
        assert_eq!(cfg.cache_ttls.prices_secs, 3600);
        assert!((cfg.weights.fear_greed - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "bind_addr": "127.0.0.1:8080", "default_days": 30 }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.default_days, 30);
        assert_eq!(cfg.history_days, 90);
        assert_eq!(cfg.cache_capacity, 100);
    }

    #[test]
    fn deserialise_partial_nested_sections() {
        let json = r#"{
            "cache_ttls": { "news_secs": 120 },
            "weights": { "technical": 0.5 },
            "extra_symbols": { "sui": "SUIUSDT" }
        }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.cache_ttls.news_secs, 120);
        assert_eq!(cfg.cache_ttls.funding_secs, 300);
        assert!((cfg.weights.technical - 0.5).abs() < f64::EPSILON);
        assert!((cfg.weights.news - 0.25).abs() < f64::EPSILON);
        assert_eq!(cfg.extra_symbols.get("sui").map(String::as_str), Some("SUIUSDT"));
    }

    #[test]
    fn ttl_accessors_convert_to_durations() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.news(), Duration::from_secs(600));
        assert_eq!(ttls.fear_greed(), Duration::from_secs(3600));
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = EngineConfig::default();
        cfg.extra_symbols
            .insert("sui".to_string(), "SUIUSDT".to_string());
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.bind_addr, cfg2.bind_addr);
        assert_eq!(cfg.cache_ttls.news_secs, cfg2.cache_ttls.news_secs);
        assert_eq!(cfg.extra_symbols, cfg2.extra_symbols);
    }
}
