// =============================================================================
// Multi-Source Prediction Module
// =============================================================================
//
// Blends the technical analysis with up to four optional external signals
// into one weighted verdict.  Nominal weights:
//
//   technical    35%   (always present)
//   news         25%   (scaled down further by article coverage)
//   funding      15%
//   market       15%
//   fear & greed 10%
//
// An absent source contributes a neutral 50 at zero weight, and the weighted
// average divides by the weights actually in play, so missing sources
// redistribute influence instead of dragging the score toward neutral.

pub mod engine;
pub mod narrative;

pub use engine::PredictionEngine;

use serde::{Deserialize, Serialize};

use crate::analysis::TechnicalAnalysis;
use crate::types::{PositioningSentiment, PredictionVerdict, SourceSignal};

fn default_technical_weight() -> f64 {
    0.35
}

fn default_news_weight() -> f64 {
    0.25
}

fn default_funding_weight() -> f64 {
    0.15
}

fn default_market_weight() -> f64 {
    0.15
}

fn default_fear_greed_weight() -> f64 {
    0.10
}

/// Nominal per-source weights. Values are fractions of 1.0 but are never
/// required to sum to 1.0; the engine renormalizes by the weights in play.
/// Every field carries a serde default so partial config files keep working.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceWeights {
    #[serde(default = "default_technical_weight")]
    pub technical: f64,
    #[serde(default = "default_news_weight")]
    pub news: f64,
    #[serde(default = "default_funding_weight")]
    pub funding: f64,
    #[serde(default = "default_market_weight")]
    pub market: f64,
    #[serde(default = "default_fear_greed_weight")]
    pub fear_greed: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            technical: default_technical_weight(),
            news: default_news_weight(),
            funding: default_funding_weight(),
            market: default_market_weight(),
            fear_greed: default_fear_greed_weight(),
        }
    }
}

/// Aggregated news sentiment for a coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSignal {
    /// 0-100, bullish high.
    pub score: f64,
    pub signal: SourceSignal,
    /// 0-100, scales with article coverage.
    pub confidence: f64,
    pub total_news: u32,
}

/// Latest futures funding rate, already classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingSignal {
    /// Funding rate in percent per interval.
    pub rate: f64,
    pub signal: SourceSignal,
    /// 0-100, bullish high.
    pub score: f64,
}

/// Futures positioning metrics, already classified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSignal {
    pub long_short_ratio: f64,
    pub signal: SourceSignal,
    /// 0-100, bullish high.
    pub score: f64,
    pub sentiment: PositioningSentiment,
}

/// Raw Fear & Greed index reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FearGreedSignal {
    pub value: f64,
    pub classification: String,
}

/// Everything one prediction is computed from. Each optional source that is
/// `None` is treated as absent: neutral score, zero weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    pub technical: TechnicalAnalysis,
    pub news: Option<NewsSignal>,
    pub funding: Option<FundingSignal>,
    pub market: Option<MarketSignal>,
    pub fear_greed: Option<FearGreedSignal>,
}

/// One source's contribution to the final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceScore {
    /// Rounded 0-100 component score.
    pub score: f64,
    /// Percent of the nominal maximum weight actually applied.
    pub weight: f64,
    /// Wire label of the source's own signal.
    pub signal: String,
}

/// Per-source contributions, in fixed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub technical: SourceScore,
    pub news: SourceScore,
    pub funding: SourceScore,
    pub market: SourceScore,
    pub sentiment: SourceScore,
}

/// Final assembled prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedPrediction {
    pub verdict: PredictionVerdict,
    /// Rounded, clamped to [20, 95].
    pub confidence: f64,
    pub target_price: f64,
    /// Percent move, rounded to two decimals, capped by timeframe.
    pub price_change: f64,
    pub timeframe: String,
    pub breakdown: SourceBreakdown,
    /// Rounded weighted average of the component scores.
    pub total_score: f64,
    pub sources_used: Vec<String>,
    pub analysis: String,
}
