// =============================================================================
// Prediction Narrative
// =============================================================================
//
// Deterministic sentence assembly: a fixed set of triggers, each contributing
// at most one sentence, joined in a fixed order.  Same input, same text —
// there is no randomness and no clock.
//
// Always emitted: the overall verdict line and the technical line.  The rest
// fire only on their conditions: news when it was actually used, funding only
// when it leans, positioning only at the extremes, fear/greed only beyond 25
// and 75.

use crate::types::{PositioningSentiment, PredictionVerdict, SourceSignal};

use super::PredictionInput;

/// Build the human-readable analysis for one prediction.
pub fn generate(
    verdict: PredictionVerdict,
    confidence: f64,
    source_count: usize,
    input: &PredictionInput,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "Our {source_count}-source analysis indicates a {} signal with {confidence}% confidence.",
        verdict.as_str().replace('_', " ")
    ));

    parts.push(format!(
        "Technical indicators show {} with RSI at {:.1}.",
        input.technical.signals.overall.as_str().replace('_', " "),
        input.technical.rsi
    ));

    if let Some(news) = &input.news {
        if news.total_news > 0 {
            let mood = if news.score > 60.0 {
                "positive"
            } else if news.score < 40.0 {
                "negative"
            } else {
                "mixed"
            };
            parts.push(format!(
                "Recent news sentiment is {mood} based on {} articles.",
                news.total_news
            ));
        }
    }

    if let Some(funding) = &input.funding {
        match funding.signal {
            SourceSignal::Bearish => parts.push(
                "High funding rates suggest overleveraged longs, creating downside risk."
                    .to_string(),
            ),
            SourceSignal::Bullish => parts.push(
                "Negative funding rates indicate potential for short squeeze upward.".to_string(),
            ),
            SourceSignal::Neutral => {}
        }
    }

    if let Some(market) = &input.market {
        match market.sentiment {
            PositioningSentiment::ExtremeLong => parts.push(format!(
                "Long/short ratio shows extreme long positioning ({:.2}), creating liquidation risk.",
                market.long_short_ratio
            )),
            PositioningSentiment::ExtremeShort => parts.push(format!(
                "Long/short ratio shows extreme short positioning ({:.2}), creating squeeze potential.",
                market.long_short_ratio
            )),
            _ => {}
        }
    }

    if let Some(fg) = &input.fear_greed {
        if fg.value < 25.0 {
            parts.push(format!(
                "Market is in extreme fear ({}), which historically presents buying opportunities.",
                fg.value
            ));
        } else if fg.value > 75.0 {
            parts.push(format!(
                "Market is in extreme greed ({}), suggesting potential for correction.",
                fg.value
            ));
        }
    }

    parts.join(" ")
}
