// =============================================================================
// API Usage Monitor
// =============================================================================
//
// Tracks outbound calls to the upstream data providers. The free tiers are
// small (CryptoPanic ~500 requests/day, CoinGecko ~330/day on the public
// endpoints), so the monitor keeps a rolling daily window, warns as a
// provider budget approaches, and exposes a snapshot for the REST surface.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

const DAILY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

const CRYPTOPANIC_DAILY_BUDGET: u64 = 500;
const CRYPTOPANIC_WARN_AT: u64 = 400;
const COINGECKO_DAILY_BUDGET: u64 = 330;
const COINGECKO_WARN_AT: u64 = 300;

/// Log a usage breakdown every this many recorded calls.
const BREAKDOWN_EVERY: u64 = 50;

struct MonitorState {
    total_calls: u64,
    by_endpoint: BTreeMap<String, u64>,
    window_start: Instant,
}

/// Rolling daily counter over upstream API calls.
pub struct UsageMonitor {
    state: Mutex<MonitorState>,
    window: Duration,
}

/// Point-in-time view of the current window, served by the REST surface.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub total_calls: u64,
    pub by_endpoint: BTreeMap<String, u64>,
    pub hours_since_reset: f64,
}

impl UsageMonitor {
    pub fn new() -> Self {
        Self::with_window(DAILY_WINDOW)
    }

    /// Monitor with a custom reset window. Tests pass `Duration::ZERO` to
    /// force a roll on every call.
    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Mutex::new(MonitorState {
                total_calls: 0,
                by_endpoint: BTreeMap::new(),
                window_start: Instant::now(),
            }),
            window,
        }
    }

    /// Count one outbound call against the named endpoint.
    pub fn record(&self, endpoint: &str) {
        let mut state = self.state.lock();

        if state.window_start.elapsed() >= self.window {
            info!(
                total_calls = state.total_calls,
                "api usage window rolled, counters reset"
            );
            state.total_calls = 0;
            state.by_endpoint.clear();
            state.window_start = Instant::now();
        }

        state.total_calls += 1;
        *state.by_endpoint.entry(endpoint.to_string()).or_insert(0) += 1;

        let cryptopanic = provider_total(&state.by_endpoint, "cryptopanic");
        if cryptopanic >= CRYPTOPANIC_WARN_AT {
            warn!(
                calls = cryptopanic,
                budget = CRYPTOPANIC_DAILY_BUDGET,
                "cryptopanic daily budget nearly exhausted"
            );
        }
        let coingecko = provider_total(&state.by_endpoint, "coingecko");
        if coingecko >= COINGECKO_WARN_AT {
            warn!(
                calls = coingecko,
                budget = COINGECKO_DAILY_BUDGET,
                "coingecko daily budget nearly exhausted"
            );
        }

        if state.total_calls % BREAKDOWN_EVERY == 0 {
            info!(
                total_calls = state.total_calls,
                breakdown = ?state.by_endpoint,
                "api usage breakdown"
            );
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let state = self.state.lock();
        let hours = state.window_start.elapsed().as_secs_f64() / 3600.0;
        UsageSnapshot {
            total_calls: state.total_calls,
            by_endpoint: state.by_endpoint.clone(),
            hours_since_reset: (hours * 10.0).round() / 10.0,
        }
    }
}

impl Default for UsageMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn provider_total(by_endpoint: &BTreeMap<String, u64>, provider: &str) -> u64 {
    by_endpoint
        .iter()
        .filter(|(endpoint, _)| endpoint.starts_with(provider))
        .map(|(_, count)| *count)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_counted_per_endpoint() {
        let monitor = UsageMonitor::new();
        monitor.record("coingecko-chart");
        monitor.record("coingecko-chart");
        monitor.record("cryptopanic");

        let snap = monitor.snapshot();
        assert_eq!(snap.total_calls, 3);
        assert_eq!(snap.by_endpoint.get("coingecko-chart"), Some(&2));
        assert_eq!(snap.by_endpoint.get("cryptopanic"), Some(&1));
        assert_eq!(snap.hours_since_reset, 0.0);
    }

    #[test]
    fn empty_monitor_snapshot() {
        let monitor = UsageMonitor::new();
        let snap = monitor.snapshot();
        assert_eq!(snap.total_calls, 0);
        assert!(snap.by_endpoint.is_empty());
    }

    #[test]
    fn window_roll_resets_counters() {
        // Zero window: every record first rolls the window, so the count
        // never climbs past one.
        let monitor = UsageMonitor::with_window(Duration::ZERO);
        monitor.record("coingecko-chart");
        monitor.record("coingecko-chart");
        monitor.record("coingecko-chart");

        let snap = monitor.snapshot();
        assert_eq!(snap.total_calls, 1);
        assert_eq!(snap.by_endpoint.get("coingecko-chart"), Some(&1));
    }

    #[test]
    fn provider_totals_group_by_prefix() {
        let mut by_endpoint = BTreeMap::new();
        by_endpoint.insert("coingecko-chart".to_string(), 7);
        by_endpoint.insert("coingecko-price".to_string(), 5);
        by_endpoint.insert("cryptopanic".to_string(), 3);
        by_endpoint.insert("binance-funding".to_string(), 9);

        assert_eq!(provider_total(&by_endpoint, "coingecko"), 12);
        assert_eq!(provider_total(&by_endpoint, "cryptopanic"), 3);
        assert_eq!(provider_total(&by_endpoint, "binance"), 9);
        assert_eq!(provider_total(&by_endpoint, "kraken"), 0);
    }

    #[test]
    fn breakdown_boundary_does_not_disturb_counts() {
        let monitor = UsageMonitor::new();
        for _ in 0..BREAKDOWN_EVERY {
            monitor.record("coingecko-chart");
        }
        assert_eq!(monitor.snapshot().total_calls, BREAKDOWN_EVERY);
    }
}
