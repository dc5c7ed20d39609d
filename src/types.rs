// =============================================================================
// Shared types used across the Meridian prediction engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Direction of a trend-following indicator. There is no flat state: the
/// comparisons that produce it always resolve to one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Volume relative to its recent average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl Default for VolumeTrend {
    fn default() -> Self {
        Self::Stable
    }
}

impl VolumeTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "INCREASING",
            Self::Decreasing => "DECREASING",
            Self::Stable => "STABLE",
        }
    }
}

impl std::fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate signal produced by the technical analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallSignal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Default for OverallSignal {
    fn default() -> Self {
        Self::Neutral
    }
}

impl OverallSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Neutral => "NEUTRAL",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }
}

impl std::fmt::Display for OverallSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final verdict of the multi-source aggregator. Differs from
/// [`OverallSignal`] in the middle band: the combined view says HOLD where a
/// single indicator set says NEUTRAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionVerdict {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl PredictionVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG_BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }
}

impl std::fmt::Display for PredictionVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directional stance reported by an external signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceSignal {
    Bullish,
    Neutral,
    Bearish,
}

impl Default for SourceSignal {
    fn default() -> Self {
        Self::Neutral
    }
}

impl SourceSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Neutral => "NEUTRAL",
            Self::Bearish => "BEARISH",
        }
    }
}

impl std::fmt::Display for SourceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How crowded futures positioning is, derived from the top-trader
/// long/short ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositioningSentiment {
    ExtremeLong,
    LongBias,
    Balanced,
    ShortBias,
    ExtremeShort,
}

impl Default for PositioningSentiment {
    fn default() -> Self {
        Self::Balanced
    }
}

impl PositioningSentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtremeLong => "EXTREME_LONG",
            Self::LongBias => "LONG_BIAS",
            Self::Balanced => "BALANCED",
            Self::ShortBias => "SHORT_BIAS",
            Self::ExtremeShort => "EXTREME_SHORT",
        }
    }
}

impl std::fmt::Display for PositioningSentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contrarian stance derived from the Fear & Greed index: fear is a buying
/// opportunity, greed a selling one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FearGreedStance {
    Buy,
    Neutral,
    Sell,
}

impl Default for FearGreedStance {
    fn default() -> Self {
        Self::Neutral
    }
}

impl FearGreedStance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Neutral => "NEUTRAL",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for FearGreedStance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
