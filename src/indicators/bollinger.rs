// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Volatility envelope around a simple moving average:
//   middle = SMA(period)
//   upper  = middle + multiplier * σ
//   lower  = middle - multiplier * σ
//
// σ is the population standard deviation over the trailing window.  When the
// series is shorter than `period` the window shrinks but the variance divisor
// stays `period`, which damps the bands on thin history instead of inflating
// them.
//
// `position` normalizes the latest price into the envelope: 0 at the lower
// band, 1 at the upper band, clamped when price escapes the bands.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::moving_average;

/// Band envelope plus the latest price's normalized position inside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// 0 = at the lower band, 1 = at the upper band.
    pub position: f64,
}

/// Compute the band envelope for the given closes.
///
/// # Edge cases
/// - empty series => all-zero bands, position 0.5
/// - `period == 0` => degenerate bands pinned at the latest price, position 0.5
/// - zero variance (flat window) => upper == lower, position 0.5 instead of
///   a 0/0 division
pub fn bands(closes: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let Some(&latest) = closes.last() else {
        return BollingerBands {
            upper: 0.0,
            middle: 0.0,
            lower: 0.0,
            position: 0.5,
        };
    };
    if period == 0 {
        return BollingerBands {
            upper: latest,
            middle: latest,
            lower: latest,
            position: 0.5,
        };
    }

    let middle = moving_average::simple(closes, period);

    let window = &closes[closes.len().saturating_sub(period)..];
    let variance = window.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + std_dev * multiplier;
    let lower = middle - std_dev * multiplier;

    let span = upper - lower;
    let position = if span <= f64::EPSILON {
        0.5
    } else {
        ((latest - lower) / span).clamp(0.0, 1.0)
    };

    BollingerBands {
        upper,
        middle,
        lower,
        position,
    }
}
