// =============================================================================
// Technical Analyzer
// =============================================================================
//
// Runs the full indicator suite over a price/volume history and reduces it to
// a single bullish score in [0, 100], built from four 25-point buckets plus a
// volume modifier:
//
//   momentum    — oversold +25, overbought 0, middle band scaled by how close
//                 the oscillator sits to 50
//   convergence — MACD line above its signal +25
//   MA cross    — short SMA above long SMA +25
//   bands       — near the lower band +25, near the upper 0, mid-range +12.5
//   volume      — rising volume adds 10 to a leaning base (>50) and subtracts
//                 10 from a weak one (<50); an exactly neutral base is left
//                 alone
//
// Thresholds:  >=80 STRONG_BUY, >=60 BUY, >=40 NEUTRAL, >=20 SELL, else
// STRONG_SELL.
// =============================================================================

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::indicators::bollinger::{self, BollingerBands};
use crate::indicators::macd::{self, MacdResult};
use crate::indicators::moving_average;
use crate::indicators::rsi;
use crate::indicators::volume::{self, VolumeAnalysis};
use crate::types::{OverallSignal, Trend, VolumeTrend};

pub const RSI_PERIOD: usize = 14;
const SMA_SHORT_PERIOD: usize = 7;
const SMA_LONG_PERIOD: usize = 30;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_MULTIPLIER: f64 = 2.0;

/// Short/long simple averages, fast/slow exponentials, and the cross state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MovingAverages {
    pub sma_short: f64,
    pub sma_long: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub trend: Trend,
}

/// Reduced verdict of the indicator suite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalSummary {
    pub overall: OverallSignal,
    /// Bullish score, rounded, in [0, 100].
    pub strength: f64,
}

/// Immutable snapshot of one full analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub rsi: f64,
    pub macd: MacdResult,
    pub moving_averages: MovingAverages,
    pub bollinger: BollingerBands,
    pub volume: VolumeAnalysis,
    pub signals: SignalSummary,
}

/// Run every indicator over `prices` (and `volumes` when available) and
/// reduce to a scored summary.
///
/// # Errors
/// Fails on an empty price series; everything downstream assumes at least
/// one point. Short-but-nonempty series degrade through the individual
/// indicators' documented fallbacks instead.
pub fn analyze(prices: &[f64], volumes: Option<&[f64]>) -> Result<TechnicalAnalysis> {
    if prices.is_empty() {
        anyhow::bail!("technical analysis requires at least one price point");
    }

    let rsi = rsi::relative_strength(prices, RSI_PERIOD);
    let macd = macd::convergence(prices);
    let sma_short = moving_average::simple(prices, SMA_SHORT_PERIOD);
    let sma_long = moving_average::simple(prices, SMA_LONG_PERIOD);
    let ema_fast = moving_average::exponential(prices, macd::FAST_PERIOD);
    let ema_slow = moving_average::exponential(prices, macd::SLOW_PERIOD);
    let bollinger = bollinger::bands(prices, BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER);
    let volume = match volumes {
        Some(v) => volume::analyze(v),
        None => VolumeAnalysis::absent(),
    };

    let ma_trend = if sma_short > sma_long {
        Trend::Bullish
    } else {
        Trend::Bearish
    };

    let mut score: f64 = 0.0;

    // Momentum bucket. The middle band rewards proximity to 50, so a
    // trending-but-not-extreme oscillator earns less than a becalmed one.
    if rsi < 30.0 {
        score += 25.0;
    } else if rsi > 70.0 {
        // Overbought: no points.
    } else {
        score += (50.0 - (rsi - 50.0).abs()) / 50.0 * 25.0;
    }

    // Convergence bucket.
    if macd.trend == Trend::Bullish {
        score += 25.0;
    }

    // Golden / death cross bucket.
    if ma_trend == Trend::Bullish {
        score += 25.0;
    }

    // Band-position bucket: the lower band is a discount, the upper a
    // premium.
    if bollinger.position < 0.2 {
        score += 25.0;
    } else if bollinger.position > 0.8 {
        // Premium: no points.
    } else {
        score += 12.5;
    }

    // Volume confirms whichever side the base already leans to.
    if volume.trend == VolumeTrend::Increasing {
        if score > 50.0 {
            score += 10.0;
        } else if score < 50.0 {
            score -= 10.0;
        }
    }

    let score = score.clamp(0.0, 100.0);

    let overall = if score >= 80.0 {
        OverallSignal::StrongBuy
    } else if score >= 60.0 {
        OverallSignal::Buy
    } else if score >= 40.0 {
        OverallSignal::Neutral
    } else if score >= 20.0 {
        OverallSignal::Sell
    } else {
        OverallSignal::StrongSell
    };

    debug!(
        rsi = format!("{rsi:.1}"),
        macd_trend = %macd.trend,
        ma_trend = %ma_trend,
        band_position = format!("{:.2}", bollinger.position),
        volume_trend = %volume.trend,
        strength = score.round(),
        "technical analysis complete"
    );

    Ok(TechnicalAnalysis {
        rsi,
        macd,
        moving_averages: MovingAverages {
            sma_short,
            sma_long,
            ema_fast,
            ema_slow,
            trend: ma_trend,
        },
        bollinger,
        volume,
        signals: SignalSummary {
            overall,
            strength: score.round(),
        },
    })
}
