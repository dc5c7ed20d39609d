// =============================================================================
// Prediction Service — source orchestration
// =============================================================================
//
// Glues the providers to the engine for one coin:
//
//   1. fetch price history (the only fetch allowed to fail the request)
//   2. run the technical analysis over it
//   3. fetch news, funding, positioning and fear/greed concurrently,
//      degrading each failure to an absent source
//   4. weigh everything into the final prediction
//
// A coin with no news key, no futures contract and a dead index feed still
// gets a prediction from technicals alone.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::{self, TechnicalAnalysis};
use crate::prediction::{
    EnhancedPrediction, FearGreedSignal, FundingSignal, MarketSignal, NewsSignal,
    PredictionEngine, PredictionInput,
};
use crate::sentiment::{self, SentimentBlend};
use crate::sources::{
    FearGreedSnapshot, FearGreedTracker, FundingRateMonitor, FundingSnapshot,
    MarketMetricsMonitor, MarketSnapshot, NewsSentimentMonitor, NewsSnapshot,
    PriceHistoryProvider,
};

/// Full response for one prediction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinPrediction {
    pub coin_id: String,
    pub current_price: f64,
    /// Horizon the prediction is for.
    pub days: u32,
    pub prediction: EnhancedPrediction,
    /// The indicator set backing the technical component, embedded so a
    /// caller can chart it without a second request.
    pub technical: TechnicalAnalysis,
    /// Fear/greed-blended view of the technical strength.
    pub sentiment_adjusted: Option<SentimentBlend>,
    pub generated_at: String,
}

/// Orchestrates providers and engine. One instance serves all coins.
pub struct PredictionService {
    prices: Arc<PriceHistoryProvider>,
    news: Arc<NewsSentimentMonitor>,
    funding: Arc<FundingRateMonitor>,
    market: Arc<MarketMetricsMonitor>,
    fear_greed: Arc<FearGreedTracker>,
    engine: PredictionEngine,
    /// How much history the indicators see, independent of the horizon.
    history_days: u32,
}

impl PredictionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        prices: Arc<PriceHistoryProvider>,
        news: Arc<NewsSentimentMonitor>,
        funding: Arc<FundingRateMonitor>,
        market: Arc<MarketMetricsMonitor>,
        fear_greed: Arc<FearGreedTracker>,
        engine: PredictionEngine,
        history_days: u32,
    ) -> Self {
        Self {
            prices,
            news,
            funding,
            market,
            fear_greed,
            engine,
            history_days,
        }
    }

    /// Build a full prediction for `coin_id` over a `days` horizon.
    pub async fn predict(&self, coin_id: &str, days: u32) -> Result<CoinPrediction> {
        let history = self.prices.fetch(coin_id, self.history_days).await?;
        let technical = analysis::analyze(&history.prices, Some(&history.volumes))?;

        let (news, funding, market, fear_greed) = tokio::join!(
            self.news.fetch(coin_id),
            self.funding.fetch(coin_id),
            self.market.fetch(coin_id),
            self.fear_greed.fetch(),
        );

        let news = news
            .map_err(|err| warn!(coin_id, error = %err, "news sentiment unavailable, excluding source"))
            .ok();
        let funding = funding
            .map_err(|err| warn!(coin_id, error = %err, "funding rate unavailable, excluding source"))
            .ok();
        let market = market
            .map_err(|err| warn!(coin_id, error = %err, "market metrics unavailable, excluding source"))
            .ok();

        let input = assemble_input(technical, news, funding, market, Some(fear_greed));
        let prediction = self.engine.predict(history.current_price, &input, days);

        let sentiment_adjusted = input.fear_greed.as_ref().map(|fg| {
            sentiment::blend_with_technical(input.technical.signals.strength, fg.value)
        });

        debug!(
            coin_id,
            days,
            verdict = %prediction.verdict,
            total_score = prediction.total_score,
            sources = prediction.sources_used.len(),
            "prediction assembled"
        );

        Ok(CoinPrediction {
            coin_id: coin_id.to_string(),
            current_price: history.current_price,
            days,
            prediction,
            technical: input.technical,
            sentiment_adjusted,
            generated_at: Utc::now().to_rfc3339(),
        })
    }
}

/// Convert provider payloads into engine inputs, preserving absence.
fn assemble_input(
    technical: TechnicalAnalysis,
    news: Option<NewsSnapshot>,
    funding: Option<FundingSnapshot>,
    market: Option<MarketSnapshot>,
    fear_greed: Option<FearGreedSnapshot>,
) -> PredictionInput {
    PredictionInput {
        technical,
        news: news.map(|s| NewsSignal {
            score: s.score,
            signal: s.signal,
            confidence: s.confidence,
            total_news: s.total_news,
        }),
        funding: funding.map(|s| FundingSignal {
            rate: s.rate,
            signal: s.signal,
            score: s.score,
        }),
        market: market.map(|s| MarketSignal {
            long_short_ratio: s.long_short_ratio,
            signal: s.signal,
            score: s.score,
            sentiment: s.sentiment,
        }),
        fear_greed: fear_greed.map(|s| FearGreedSignal {
            value: s.value,
            classification: s.classification,
        }),
    }
}
