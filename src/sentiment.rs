// =============================================================================
// Fear & Greed Sentiment Adapter
// =============================================================================
//
// The Fear & Greed index runs 0 (extreme fear) to 100 (extreme greed).  The
// engine reads it contrarian: fear marks accumulation territory, greed marks
// froth.  Three views of the same value:
//
//   score  = 100 - value          (0-100, aggregator input)
//   ratio  = (50 - value) / 50    (-1..1, positive = fear = buy-side)
//   stance = BUY <= 30, SELL >= 70, NEUTRAL between
//
// The 70/30 blend combines a technical score with the ratio for callers that
// want a single sentiment-adjusted number outside the full aggregator.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::FearGreedStance;

/// Invert the index into an aggregator score: deep fear scores high.
pub fn score_from_fear_greed(value: f64) -> f64 {
    100.0 - value
}

/// Normalize the index into a signed ratio, positive toward fear.
pub fn sentiment_ratio(value: f64) -> f64 {
    (50.0 - value) / 50.0
}

/// Contrarian trading stance for the raw index value.
pub fn stance(value: f64) -> FearGreedStance {
    if value <= 30.0 {
        FearGreedStance::Buy
    } else if value >= 70.0 {
        FearGreedStance::Sell
    } else {
        FearGreedStance::Neutral
    }
}

/// Human-readable ladder for the signed ratio.
pub fn describe(value: f64) -> &'static str {
    let ratio = sentiment_ratio(value);
    if ratio > 0.4 {
        "Extreme Fear - Strong Buy Opportunity"
    } else if ratio > 0.2 {
        "Fear - Buy Opportunity"
    } else if ratio > -0.2 {
        "Neutral - Hold Position"
    } else if ratio > -0.4 {
        "Greed - Consider Taking Profits"
    } else {
        "Extreme Greed - Strong Sell Signal"
    }
}

/// A technical score nudged by sentiment, with the shift spelled out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentBlend {
    pub adjusted_score: f64,
    pub sentiment_impact: f64,
    pub reasoning: String,
}

/// Blend a 0-100 technical score with the index at fixed 70/30 weights.
///
/// The impact is reported before clamping so callers can see how hard
/// sentiment pushed even when the result pins at a bound.
pub fn blend_with_technical(technical_score: f64, fear_greed_value: f64) -> SentimentBlend {
    const TECHNICAL_WEIGHT: f64 = 0.7;
    const SENTIMENT_WEIGHT: f64 = 0.3;

    // Map the -1..1 ratio onto the same 0-100 scale as the technical score.
    let sentiment_score = (sentiment_ratio(fear_greed_value) + 1.0) * 50.0;
    let adjusted = technical_score * TECHNICAL_WEIGHT + sentiment_score * SENTIMENT_WEIGHT;
    let impact = adjusted - technical_score;

    let reasoning = if impact.abs() < 3.0 {
        "Sentiment confirms technical analysis".to_string()
    } else if impact > 0.0 {
        format!("Market fear creating buy opportunity (+{impact:.1}%)")
    } else {
        format!("Market greed suggests caution ({impact:.1}%)")
    };

    SentimentBlend {
        adjusted_score: adjusted.clamp(0.0, 100.0),
        sentiment_impact: impact,
        reasoning,
    }
}
