// =============================================================================
// Moving Averages (SMA / EMA)
// =============================================================================
//
// Both averages report the value at the most recent point of the series, not
// the full rolling history.
//
// SMA: arithmetic mean of the last `period` values.
//
// EMA: seeded with the SMA of the *first* `period` values, then walked
// forward over the remainder:
//   multiplier = 2 / (period + 1)
//   ema        = (value - ema) * multiplier + ema
//
// A series shorter than `period` carries too little information for either
// average, so both fall back to the most recent value unchanged.
// =============================================================================

/// Simple moving average over the last `period` values.
///
/// # Edge cases
/// - empty series => 0.0
/// - `period == 0` or `len < period` => most recent value unchanged
pub fn simple(prices: &[f64], period: usize) -> f64 {
    let Some(&latest) = prices.last() else {
        return 0.0;
    };
    if period == 0 || prices.len() < period {
        return latest;
    }

    let window = &prices[prices.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Exponential moving average, seeded with the simple average of the first
/// `period` values and recursed over the rest of the series.
///
/// # Edge cases
/// - empty series => 0.0
/// - `period == 0` or `len < period` => most recent value unchanged
/// - `len == period` => the seed itself (no recursion steps)
pub fn exponential(prices: &[f64], period: usize) -> f64 {
    let Some(&latest) = prices.last() else {
        return 0.0;
    };
    if period == 0 || prices.len() < period {
        return latest;
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let mut ema = simple(&prices[..period], period);
    for &price in &prices[period..] {
        ema = (price - ema) * multiplier + ema;
    }

    ema
}
