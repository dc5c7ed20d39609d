// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// The main line is the spread between a fast and a slow EMA of the closes.
// The signal line is a 9-period EMA of that spread's own recent history,
// reconstructed by re-running both EMAs over each price prefix of the last
// `SIGNAL_WINDOW` points.  The reconstruction is quadratic in the window but
// the window is capped, so the cost stays bounded regardless of how much
// history the caller supplies.
//
// Main line above signal line => BULLISH, otherwise BEARISH.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::moving_average;
use crate::types::Trend;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

/// How many trailing prefix points the signal line is rebuilt from.
const SIGNAL_WINDOW: usize = 35;

/// MACD snapshot at the most recent point of the series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdResult {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
    pub trend: Trend,
}

/// Compute the MACD triple for the given closes.
///
/// # Edge cases
/// - empty series => all-zero lines with a BEARISH trend (0 is not > 0)
/// - series shorter than the EMA periods inherit the moving-average
///   fallbacks, so the main line degrades toward zero rather than erroring
pub fn convergence(closes: &[f64]) -> MacdResult {
    let value =
        moving_average::exponential(closes, FAST_PERIOD) - moving_average::exponential(closes, SLOW_PERIOD);

    // Rebuild the line's recent history so the signal EMA has something to
    // smooth.  Each prefix re-seeds both EMAs from the start of the series.
    let start = closes.len().saturating_sub(SIGNAL_WINDOW);
    let mut history = Vec::with_capacity(closes.len() - start);
    for end in start..closes.len() {
        let prefix = &closes[..=end];
        history.push(
            moving_average::exponential(prefix, FAST_PERIOD)
                - moving_average::exponential(prefix, SLOW_PERIOD),
        );
    }

    let signal = moving_average::exponential(&history, SIGNAL_PERIOD);
    let histogram = value - signal;
    let trend = if value > signal {
        Trend::Bullish
    } else {
        Trend::Bearish
    };

    MacdResult {
        value,
        signal,
        histogram,
        trend,
    }
}
