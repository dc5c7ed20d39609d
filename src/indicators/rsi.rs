// =============================================================================
// Relative Strength Index (RSI) — Simple Trailing-Window Averages
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Take the last `period` consecutive deltas of the series.
// Step 2 — Average the positive deltas (gains) and the absolute negative
//          deltas (losses) over the full window.
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// This is the plain-average variant: every delta in the window carries equal
// weight, and deltas older than the window carry none.  It reacts faster and
// saturates harder than Wilder's smoothed RSI.
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

/// Compute the current RSI over the trailing `period` price deltas.
///
/// # Edge cases
/// - `closes.len() < period + 1` => 50.0 (not enough deltas, neutral)
/// - zero average loss => 100.0 — this includes a perfectly flat window,
///   which has no down moves and therefore saturates high
/// - zero average gain (all down moves) => 0.0 by the formula itself
pub fn relative_strength(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in closes.len() - period..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: usize = 14;

    #[test]
    fn rsi_empty_input_is_neutral() {
        assert_eq!(relative_strength(&[], PERIOD), 50.0);
    }

    #[test]
    fn rsi_insufficient_data_is_neutral() {
        // 14 closes give only 13 deltas; one short of a full window.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert_eq!(relative_strength(&closes, PERIOD), 50.0);
    }

    #[test]
    fn rsi_all_gains_saturates_high() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert!((relative_strength(&closes, PERIOD) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_all_losses_saturates_low() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        assert!(relative_strength(&closes, PERIOD).abs() < 1e-10);
    }

    #[test]
    fn rsi_flat_window_saturates_high() {
        // No down moves at all => zero average loss => 100.
        let closes = vec![100.0; 30];
        assert!((relative_strength(&closes, PERIOD) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        // Alternating +1/-1 deltas: average gain equals average loss.
        let mut closes = vec![10.0];
        for i in 0..PERIOD {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        assert!((relative_strength(&closes, PERIOD) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_only_trailing_window_counts() {
        // A crash before the window must not affect the value.
        let mut closes = vec![100.0];
        closes.extend((1..=15).map(|x| x as f64));
        assert!((relative_strength(&closes, PERIOD) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let v = relative_strength(&closes, PERIOD);
        assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
    }
}
