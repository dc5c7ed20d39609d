// =============================================================================
// Central Application State
// =============================================================================
//
// Ties the providers, the usage monitor and the prediction service together
// behind one `Arc<AppState>` shared by every request handler. All interior
// mutability lives inside the subsystems (caches and counters); the state
// itself is immutable after construction.

use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::monitor::UsageMonitor;
use crate::prediction::PredictionEngine;
use crate::service::PredictionService;
use crate::sources::{
    FearGreedTracker, FundingRateMonitor, MarketMetricsMonitor, NewsSentimentMonitor,
    PriceHistoryProvider, SymbolTable,
};

/// Shared state for the REST surface.
pub struct AppState {
    pub config: EngineConfig,
    pub monitor: Arc<UsageMonitor>,

    // Providers are exposed directly so the source endpoints can serve
    // their payloads without going through a full prediction.
    pub prices: Arc<PriceHistoryProvider>,
    pub news: Arc<NewsSentimentMonitor>,
    pub funding: Arc<FundingRateMonitor>,
    pub market: Arc<MarketMetricsMonitor>,
    pub fear_greed: Arc<FearGreedTracker>,

    pub service: PredictionService,

    /// Process start, for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Wire up every subsystem from the configuration. One HTTP client is
    /// shared across all providers.
    pub fn new(config: EngineConfig, news_api_key: Option<String>) -> Self {
        let monitor = Arc::new(UsageMonitor::new());
        let symbols = Arc::new(SymbolTable::with_extra(config.extra_symbols.clone()));

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build shared reqwest client");

        let prices = Arc::new(PriceHistoryProvider::new(
            client.clone(),
            config.cache_ttls.prices(),
            config.cache_capacity,
            Arc::clone(&monitor),
        ));
        let news = Arc::new(NewsSentimentMonitor::new(
            client.clone(),
            news_api_key,
            config.cache_ttls.news(),
            Arc::clone(&monitor),
        ));
        let funding = Arc::new(FundingRateMonitor::new(
            client.clone(),
            config.cache_ttls.funding(),
            config.cache_capacity,
            Arc::clone(&symbols),
            Arc::clone(&monitor),
        ));
        let market = Arc::new(MarketMetricsMonitor::new(
            client.clone(),
            config.cache_ttls.market(),
            config.cache_capacity,
            Arc::clone(&symbols),
            Arc::clone(&monitor),
        ));
        let fear_greed = Arc::new(FearGreedTracker::new(
            client,
            config.cache_ttls.fear_greed(),
            Arc::clone(&monitor),
        ));

        let service = PredictionService::new(
            Arc::clone(&prices),
            Arc::clone(&news),
            Arc::clone(&funding),
            Arc::clone(&market),
            Arc::clone(&fear_greed),
            PredictionEngine::new(config.weights),
            config.history_days,
        );

        Self {
            config,
            monitor,
            prices,
            news,
            funding,
            market,
            fear_greed,
            service,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_wires_up_from_default_config() {
        let state = AppState::new(EngineConfig::default(), None);
        assert_eq!(state.config.default_days, 7);
        assert_eq!(state.monitor.snapshot().total_calls, 0);
        assert!(state.uptime_seconds() < 5);
    }
}
