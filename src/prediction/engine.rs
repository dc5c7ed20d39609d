// =============================================================================
// Prediction Engine — weighted multi-source aggregation
// =============================================================================
//
// `predict` is a pure function of its arguments: no I/O, no shared state, no
// clock reads.  The pipeline runs in fixed phases:
//
//   1. derive a 0-100 technical score from the full indicator snapshot
//   2. admit each optional source, assigning its weight (news is additionally
//      scaled by coverage confidence)
//   3. weighted average over the weights actually admitted
//   4. map the total to a verdict, build the confidence heuristic
//   5. project a capped, timeframe-scaled price move
//   6. assemble the breakdown and narrative

use tracing::debug;

use crate::analysis::TechnicalAnalysis;
use crate::sentiment;
use crate::types::{OverallSignal, PredictionVerdict, SourceSignal, Trend};

use super::narrative;
use super::{
    EnhancedPrediction, PredictionInput, SourceBreakdown, SourceScore, SourceWeights,
};

/// The multi-source aggregator. Cheap to construct and freely shareable;
/// holds nothing but the weight table.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    weights: SourceWeights,
}

impl PredictionEngine {
    pub fn new(weights: SourceWeights) -> Self {
        Self { weights }
    }

    /// Produce one prediction for `current_price` over a horizon of `days`.
    pub fn predict(
        &self,
        current_price: f64,
        input: &PredictionInput,
        days: u32,
    ) -> EnhancedPrediction {
        let mut sources_used = vec!["Technical Analysis".to_string()];

        // --- technical (always in play) ---
        let technical_score = technical_score(&input.technical);
        let technical_weight = self.weights.technical;

        // --- news (admitted only with actual coverage) ---
        let mut news_score = 50.0;
        let mut news_weight = 0.0;
        let mut news_signal = SourceSignal::Neutral;
        if let Some(news) = &input.news {
            if news.total_news > 0 {
                news_score = news.score;
                news_signal = news.signal;
                sources_used.push("News Sentiment".to_string());

                // Thin coverage earns 50-100% of the nominal weight.
                let confidence_factor = (news.confidence / 100.0).min(1.0);
                news_weight = self.weights.news * (0.5 + 0.5 * confidence_factor);
            }
        }

        // --- funding ---
        let mut funding_score = 50.0;
        let mut funding_weight = 0.0;
        let mut funding_signal = SourceSignal::Neutral;
        if let Some(funding) = &input.funding {
            funding_score = funding.score;
            funding_weight = self.weights.funding;
            funding_signal = funding.signal;
            sources_used.push("Funding Rates".to_string());
        }

        // --- market positioning ---
        let mut market_score = 50.0;
        let mut market_weight = 0.0;
        let mut market_signal = SourceSignal::Neutral;
        if let Some(market) = &input.market {
            market_score = market.score;
            market_weight = self.weights.market;
            market_signal = market.signal;
            sources_used.push("Market Metrics".to_string());
        }

        // --- fear & greed (inverted: fear scores high) ---
        let mut sentiment_score = 50.0;
        let mut sentiment_weight = 0.0;
        let mut sentiment_signal = SourceSignal::Neutral;
        if let Some(fg) = &input.fear_greed {
            sentiment_score = sentiment::score_from_fear_greed(fg.value);
            sentiment_weight = self.weights.fear_greed;
            sentiment_signal = if fg.value < 30.0 {
                SourceSignal::Bullish
            } else if fg.value > 70.0 {
                SourceSignal::Bearish
            } else {
                SourceSignal::Neutral
            };
            sources_used.push("Fear & Greed Index".to_string());
        }

        // --- weighted average over the weights in play ---
        let total_weight =
            technical_weight + news_weight + funding_weight + market_weight + sentiment_weight;
        let total_score = if total_weight > 0.0 {
            (technical_score * technical_weight
                + news_score * news_weight
                + funding_score * funding_weight
                + market_score * market_weight
                + sentiment_score * sentiment_weight)
                / total_weight
        } else {
            50.0
        };

        let verdict = if total_score >= 70.0 {
            PredictionVerdict::StrongBuy
        } else if total_score >= 60.0 {
            PredictionVerdict::Buy
        } else if total_score >= 40.0 {
            PredictionVerdict::Hold
        } else if total_score >= 30.0 {
            PredictionVerdict::Sell
        } else {
            PredictionVerdict::StrongSell
        };

        // --- confidence: base + per-source + agreement + extremity ---
        let mut confidence = 40.0;
        confidence += (sources_used.len() as f64 - 1.0) * 10.0;

        let components = [
            technical_score,
            news_score,
            funding_score,
            market_score,
            sentiment_score,
        ];
        let bulls = components.iter().filter(|&&s| s > 50.0).count();
        let bears = components.iter().filter(|&&s| s < 50.0).count();
        let majority = bulls.max(bears);
        if majority >= 4 {
            confidence += 20.0;
        } else if majority >= 3 {
            confidence += 15.0;
        } else if majority >= 2 {
            confidence += 10.0;
        }

        let extremity = (total_score - 50.0).abs() / 50.0;
        confidence += extremity * 10.0;

        let confidence = confidence.round().clamp(20.0, 95.0);

        // --- projected move and target ---
        let price_change = price_change(total_score, confidence, &input.technical, days);
        let target_price = current_price * (1.0 + price_change / 100.0);

        let analysis = narrative::generate(verdict, confidence, sources_used.len(), input);

        debug!(
            verdict = %verdict,
            total_score = format!("{total_score:.2}"),
            confidence,
            price_change,
            sources = sources_used.len(),
            "prediction assembled"
        );

        EnhancedPrediction {
            verdict,
            confidence,
            target_price,
            price_change,
            timeframe: timeframe_label(days),
            breakdown: SourceBreakdown {
                technical: SourceScore {
                    score: technical_score.round(),
                    weight: technical_weight * 100.0,
                    signal: input.technical.signals.overall.to_string(),
                },
                news: SourceScore {
                    score: news_score.round(),
                    weight: news_weight * 100.0,
                    signal: news_signal.to_string(),
                },
                funding: SourceScore {
                    score: funding_score.round(),
                    weight: funding_weight * 100.0,
                    signal: funding_signal.to_string(),
                },
                market: SourceScore {
                    score: market_score.round(),
                    weight: market_weight * 100.0,
                    signal: market_signal.to_string(),
                },
                sentiment: SourceScore {
                    score: sentiment_score.round(),
                    weight: sentiment_weight * 100.0,
                    signal: sentiment_signal.to_string(),
                },
            },
            total_score: total_score.round(),
            sources_used,
            analysis,
        }
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(SourceWeights::default())
    }
}

/// Fold the full indicator snapshot into one 0-100 score, starting neutral.
///
/// Contributions: oscillator band up to ±20, overall signal up to ±25 scaled
/// by strength, convergence trend ±10, MA cross ±10, band position ±5.
fn technical_score(technical: &TechnicalAnalysis) -> f64 {
    let mut score = 50.0;

    if technical.rsi > 70.0 {
        score -= (technical.rsi - 70.0) / 30.0 * 20.0;
    } else if technical.rsi < 30.0 {
        score += (30.0 - technical.rsi) / 30.0 * 20.0;
    } else {
        score += (technical.rsi - 50.0) / 20.0 * 10.0;
    }

    let signal_multiplier = technical.signals.strength / 100.0;
    match technical.signals.overall {
        OverallSignal::StrongBuy => score += 25.0 * signal_multiplier,
        OverallSignal::Buy => score += 15.0 * signal_multiplier,
        OverallSignal::Sell => score -= 15.0 * signal_multiplier,
        OverallSignal::StrongSell => score -= 25.0 * signal_multiplier,
        OverallSignal::Neutral => {}
    }

    score += match technical.macd.trend {
        Trend::Bullish => 10.0,
        Trend::Bearish => -10.0,
    };

    score += match technical.moving_averages.trend {
        Trend::Bullish => 10.0,
        Trend::Bearish => -10.0,
    };

    if technical.bollinger.position < 0.2 {
        score += 5.0;
    } else if technical.bollinger.position > 0.8 {
        score -= 5.0;
    }

    score.clamp(0.0, 100.0)
}

/// Project the percent move implied by the score over the horizon.
///
/// deviation * 2.5 * confidence * volatility * timeframe, capped per horizon
/// tier, rounded to two decimals. Volatility comes from the band width and
/// is capped at 2x; a non-positive band middle zeroes it out.
fn price_change(total_score: f64, confidence: f64, technical: &TechnicalAnalysis, days: u32) -> f64 {
    let score_deviation = (total_score - 50.0) / 50.0;
    let confidence_multiplier = confidence / 100.0;

    let band_width = technical.bollinger.upper - technical.bollinger.lower;
    let band_width_percent = if technical.bollinger.middle > 0.0 {
        band_width / technical.bollinger.middle * 100.0
    } else {
        0.0
    };
    let volatility_multiplier = (band_width_percent / 10.0).min(2.0);

    let timeframe_multiplier = if days == 1 {
        1.0
    } else if days <= 7 {
        1.0 + (days - 1) as f64 * 0.15
    } else if days <= 30 {
        2.0 + (days - 7) as f64 * 0.08
    } else {
        4.0
    };

    let raw = score_deviation
        * 2.5
        * confidence_multiplier
        * volatility_multiplier
        * timeframe_multiplier;

    let max_change = if days == 1 {
        8.0
    } else if days <= 7 {
        15.0
    } else if days <= 30 {
        35.0
    } else {
        50.0
    };

    let capped = raw.clamp(-max_change, max_change);
    (capped * 100.0).round() / 100.0
}

/// Human label for the horizon.
fn timeframe_label(days: u32) -> String {
    match days {
        1 => "24 hours".to_string(),
        2..=3 => "24-72 hours".to_string(),
        7 => "1 week".to_string(),
        30 => "1 month".to_string(),
        other => format!("{other} days"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MovingAverages, SignalSummary};
    use crate::indicators::bollinger::BollingerBands;
    use crate::indicators::macd::MacdResult;
    use crate::indicators::volume::VolumeAnalysis;
    use crate::prediction::{FearGreedSignal, FundingSignal, MarketSignal, NewsSignal};
    use crate::types::{PositioningSentiment, VolumeTrend};

    /// Bullish technical fixture: band width 20% of the middle, so the
    /// volatility multiplier saturates at exactly 2.
    fn bullish_technical(strength: f64, overall: OverallSignal, rsi: f64) -> TechnicalAnalysis {
        TechnicalAnalysis {
            rsi,
            macd: MacdResult {
                value: 1.0,
                signal: 0.5,
                histogram: 0.5,
                trend: Trend::Bullish,
            },
            moving_averages: MovingAverages {
                sma_short: 105.0,
                sma_long: 100.0,
                ema_fast: 104.0,
                ema_slow: 101.0,
                trend: Trend::Bullish,
            },
            bollinger: BollingerBands {
                upper: 110.0,
                middle: 100.0,
                lower: 90.0,
                position: 0.5,
            },
            volume: VolumeAnalysis {
                current_volume: 1000.0,
                average_volume: 900.0,
                trend: VolumeTrend::Increasing,
            },
            signals: SignalSummary { overall, strength },
        }
    }

    fn bearish_technical() -> TechnicalAnalysis {
        let mut t = bullish_technical(80.0, OverallSignal::StrongSell, 25.0);
        t.macd.trend = Trend::Bearish;
        t.moving_averages.trend = Trend::Bearish;
        t.bollinger.position = 0.9;
        t
    }

    fn technical_only(technical: TechnicalAnalysis) -> PredictionInput {
        PredictionInput {
            technical,
            news: None,
            funding: None,
            market: None,
            fear_greed: None,
        }
    }

    fn all_sources_bullish() -> PredictionInput {
        PredictionInput {
            technical: bullish_technical(80.0, OverallSignal::StrongBuy, 75.0),
            news: Some(NewsSignal {
                score: 70.0,
                signal: SourceSignal::Bullish,
                confidence: 80.0,
                total_news: 12,
            }),
            funding: Some(FundingSignal {
                rate: -0.02,
                signal: SourceSignal::Bullish,
                score: 65.0,
            }),
            market: Some(MarketSignal {
                long_short_ratio: 0.6,
                signal: SourceSignal::Bullish,
                score: 60.0,
                sentiment: PositioningSentiment::ShortBias,
            }),
            fear_greed: Some(FearGreedSignal {
                value: 20.0,
                classification: "Extreme Fear".to_string(),
            }),
        }
    }

    // ---- technical_score -------------------------------------------------

    #[test]
    fn technical_score_strong_buy_fixture() {
        // 50 - (75-70)/30*20 + 25*0.8 + 10 + 10 = 86.666...
        let score = technical_score(&bullish_technical(80.0, OverallSignal::StrongBuy, 75.0));
        assert!((score - 86.6666666666).abs() < 1e-6);
    }

    #[test]
    fn technical_score_strong_sell_fixture() {
        // 50 + (30-25)/30*20 - 25*0.8 - 10 - 10 - 5 = 8.333...
        let score = technical_score(&bearish_technical());
        assert!((score - 8.3333333333).abs() < 1e-6);
    }

    #[test]
    fn technical_score_is_clamped() {
        let mut t = bearish_technical();
        t.rsi = 0.0;
        t.signals.strength = 100.0;
        assert!(technical_score(&t) >= 0.0);
    }

    // ---- predict: single source ------------------------------------------

    #[test]
    fn technical_only_prediction() {
        let engine = PredictionEngine::default();
        let input = technical_only(bullish_technical(80.0, OverallSignal::StrongBuy, 75.0));
        let p = engine.predict(100.0, &input, 7);

        // Technical score 86.67 stands alone: total 87, STRONG_BUY.
        assert_eq!(p.verdict, PredictionVerdict::StrongBuy);
        assert_eq!(p.total_score, 87.0);
        assert_eq!(p.sources_used, vec!["Technical Analysis".to_string()]);

        // Confidence: 40 base + 7.33 extremity, no agreement bonus with a
        // single non-neutral component.
        assert_eq!(p.confidence, 47.0);

        // Deviation 0.7333 * 2.5 * 0.47 * 2.0 * 1.9 = 3.2743 -> 3.27.
        assert!((p.price_change - 3.27).abs() < 1e-9);
        assert!((p.target_price - 103.27).abs() < 1e-9);
        assert_eq!(p.timeframe, "1 week");

        // Absent sources stay neutral at zero weight.
        assert_eq!(p.breakdown.news.weight, 0.0);
        assert_eq!(p.breakdown.news.score, 50.0);
        assert_eq!(p.breakdown.news.signal, "NEUTRAL");
        assert_eq!(p.breakdown.technical.weight, 35.0);
        assert_eq!(p.breakdown.technical.signal, "STRONG_BUY");
    }

    // ---- predict: full house ---------------------------------------------

    #[test]
    fn all_sources_agree_strong_buy() {
        let engine = PredictionEngine::default();
        let p = engine.predict(100.0, &all_sources_bullish(), 7);

        // News weight scales to 0.225 at confidence 80; total in-play weight
        // is 0.975 and the weighted average lands at 74.70.
        assert_eq!(p.verdict, PredictionVerdict::StrongBuy);
        assert_eq!(p.total_score, 75.0);
        assert_eq!(p.sources_used.len(), 5);

        // 40 + 40 + 20 agreement + 4.94 extremity caps at 95.
        assert_eq!(p.confidence, 95.0);

        assert!((p.breakdown.news.weight - 22.5).abs() < 1e-9);
        assert_eq!(p.breakdown.sentiment.signal, "BULLISH");
        assert_eq!(p.breakdown.sentiment.score, 80.0);

        // Deviation 0.494 * 2.5 * 0.95 * 2.0 * 1.9 = 4.4585 -> 4.46.
        assert!((p.price_change - 4.46).abs() < 1e-9);
    }

    // ---- predict: exclusions and renormalization -------------------------

    #[test]
    fn news_without_articles_is_excluded() {
        let engine = PredictionEngine::default();
        let mut input = technical_only(bullish_technical(80.0, OverallSignal::StrongBuy, 75.0));
        input.news = Some(NewsSignal {
            score: 90.0,
            signal: SourceSignal::Bullish,
            confidence: 100.0,
            total_news: 0,
        });
        let p = engine.predict(100.0, &input, 7);

        assert_eq!(p.sources_used, vec!["Technical Analysis".to_string()]);
        assert_eq!(p.breakdown.news.weight, 0.0);
        assert_eq!(p.breakdown.news.score, 50.0);
        assert_eq!(p.total_score, 87.0);
    }

    #[test]
    fn missing_sources_redistribute_weight() {
        let engine = PredictionEngine::default();
        let mut input = technical_only(bullish_technical(80.0, OverallSignal::StrongBuy, 75.0));
        input.funding = Some(FundingSignal {
            rate: 0.08,
            signal: SourceSignal::Bearish,
            score: 40.0,
        });
        let p = engine.predict(100.0, &input, 7);

        // (86.67*0.35 + 40*0.15) / 0.5 = 72.67 -> 73; a fixed 1.0
        // denominator would have produced 36 instead.
        assert_eq!(p.total_score, 73.0);
        assert_eq!(p.breakdown.technical.weight, 35.0);
        assert_eq!(p.breakdown.funding.weight, 15.0);
        assert_eq!(p.breakdown.market.weight, 0.0);
    }

    // ---- predict: bearish path -------------------------------------------

    #[test]
    fn bearish_composite_projects_downside() {
        let engine = PredictionEngine::default();
        let mut input = technical_only(bearish_technical());
        input.funding = Some(FundingSignal {
            rate: 0.12,
            signal: SourceSignal::Bearish,
            score: 30.0,
        });
        let p = engine.predict(100.0, &input, 7);

        // (8.33*0.35 + 30*0.15) / 0.5 = 14.83 -> STRONG_SELL.
        assert_eq!(p.verdict, PredictionVerdict::StrongSell);
        assert_eq!(p.total_score, 15.0);

        // 40 + 10 source + 10 agreement (two bears) + 7.03 extremity = 67.
        assert_eq!(p.confidence, 67.0);

        // Deviation -0.7033 * 2.5 * 0.67 * 2.0 * 1.9 = -4.4767 -> -4.48.
        assert!((p.price_change + 4.48).abs() < 1e-9);
        assert!((p.target_price - 95.52).abs() < 1e-9);
        assert!(p.target_price < 100.0);
    }

    // ---- predict: horizon scaling ----------------------------------------

    #[test]
    fn longer_horizons_scale_within_caps() {
        let engine = PredictionEngine::default();
        let input = all_sources_bullish();

        let day = engine.predict(100.0, &input, 1);
        let month = engine.predict(100.0, &input, 30);

        // Same composite, different horizon multipliers: 1.0 vs 3.84.
        assert!((day.price_change - 2.35).abs() < 1e-9);
        assert!((month.price_change - 9.01).abs() < 1e-9);
        assert!(day.price_change.abs() <= 8.0);
        assert!(month.price_change.abs() <= 35.0);
        assert_eq!(day.timeframe, "24 hours");
        assert_eq!(month.timeframe, "1 month");
    }

    #[test]
    fn timeframe_labels() {
        assert_eq!(timeframe_label(1), "24 hours");
        assert_eq!(timeframe_label(2), "24-72 hours");
        assert_eq!(timeframe_label(3), "24-72 hours");
        assert_eq!(timeframe_label(5), "5 days");
        assert_eq!(timeframe_label(7), "1 week");
        assert_eq!(timeframe_label(30), "1 month");
        assert_eq!(timeframe_label(90), "90 days");
    }

    // ---- invariants ------------------------------------------------------

    #[test]
    fn predict_is_deterministic() {
        let engine = PredictionEngine::default();
        let input = all_sources_bullish();
        let a = engine.predict(100.0, &input, 7);
        let b = engine.predict(100.0, &input, 7);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn outputs_stay_in_range() {
        let engine = PredictionEngine::default();
        for days in [1_u32, 3, 7, 14, 30, 90] {
            for input in [
                technical_only(bullish_technical(100.0, OverallSignal::StrongBuy, 10.0)),
                technical_only(bearish_technical()),
                all_sources_bullish(),
            ] {
                let p = engine.predict(250.0, &input, days);
                assert!((0.0..=100.0).contains(&p.total_score));
                assert!((20.0..=95.0).contains(&p.confidence));
                assert!(p.price_change.abs() <= 50.0);
                assert!(p.target_price > 0.0);
            }
        }
    }
}
