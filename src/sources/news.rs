// =============================================================================
// News Sentiment Monitor — CryptoPanic vote-classified headlines
// =============================================================================
//
// Pulls the hottest posts for a coin and classifies each by community votes:
//
//   positive + liked  >  1.5 x (negative + disliked)  =>  bullish item
//   negative + disliked > 1.5 x (positive + liked)    =>  bearish item
//   otherwise                                         =>  neutral item
//
// The aggregate score maps the bullish/bearish imbalance onto 0-100, and
// confidence scales with coverage (ten articles reads as full confidence).
// CryptoPanic's free tier is ~500 calls/day, so results are cached for ten
// minutes per coin. Without an API key the monitor degrades to a neutral
// payload with zero articles, which downstream weighting ignores.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::TtlCache;
use crate::monitor::UsageMonitor;
use crate::sources::news_ticker;
use crate::types::SourceSignal;

/// Only this many coins' news are kept warm at once.
const CACHE_CAPACITY: usize = 50;

/// How many of the returned posts are scored and carried in the payload.
const SCORED_POSTS: usize = 10;

/// Aggregated votes on one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleVotes {
    pub positive: u64,
    pub negative: u64,
}

/// One classified headline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub published_at: String,
    /// "positive", "negative" or "neutral".
    pub sentiment: String,
    pub votes: ArticleVotes,
}

/// Vote-derived news sentiment for one coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSnapshot {
    /// 0-100, bullish high.
    pub score: f64,
    pub signal: SourceSignal,
    /// 0-100, scales with article count.
    pub confidence: f64,
    pub bullish_count: u32,
    pub bearish_count: u32,
    pub neutral_count: u32,
    pub total_news: u32,
    pub recent_news: Vec<NewsArticle>,
    pub cached: bool,
    pub fetched_at: String,
}

impl NewsSnapshot {
    /// Payload served when no key is configured. Zero articles keeps this
    /// out of the prediction weighting entirely.
    pub fn neutral() -> Self {
        Self {
            score: 50.0,
            signal: SourceSignal::Neutral,
            confidence: 0.0,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            total_news: 0,
            recent_news: Vec::new(),
            cached: false,
            fetched_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Fetches and scores CryptoPanic news for a coin.
pub struct NewsSentimentMonitor {
    client: reqwest::Client,
    cache: TtlCache<NewsSnapshot>,
    monitor: Arc<UsageMonitor>,
    api_key: Option<String>,
}

impl NewsSentimentMonitor {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        ttl: Duration,
        monitor: Arc<UsageMonitor>,
    ) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl, CACHE_CAPACITY),
            monitor,
            api_key,
        }
    }

    /// Fetch and classify recent news for `coin_id`, serving from cache when
    /// fresh.
    pub async fn fetch(&self, coin_id: &str) -> Result<NewsSnapshot> {
        if let Some(mut snapshot) = self.cache.get(coin_id) {
            debug!(coin_id, "news sentiment cache hit");
            snapshot.cached = true;
            return Ok(snapshot);
        }

        let Some(api_key) = self.api_key.as_deref() else {
            warn!("cryptopanic api key not configured, serving neutral news sentiment");
            return Ok(NewsSnapshot::neutral());
        };

        self.monitor.record(&format!("cryptopanic-news/{coin_id}"));

        let ticker = news_ticker(coin_id);
        let url = format!(
            "https://cryptopanic.com/api/v1/posts/?auth_token={api_key}&currencies={ticker}&filter=hot&limit=50"
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET news sentiment for {coin_id}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse news sentiment response body")?;

        if !status.is_success() {
            anyhow::bail!("news API returned {}: {}", status, body);
        }

        let results = body["results"]
            .as_array()
            .context("news response missing results array")?;
        let snapshot = build_snapshot(results);

        debug!(
            coin_id,
            ticker = %ticker,
            score = snapshot.score,
            signal = %snapshot.signal,
            total_news = snapshot.total_news,
            "news sentiment fetched"
        );

        self.cache.insert(coin_id, snapshot.clone());
        Ok(snapshot)
    }
}

/// Classify the first [`SCORED_POSTS`] posts and aggregate them.
fn build_snapshot(results: &[serde_json::Value]) -> NewsSnapshot {
    let mut bullish_count = 0u32;
    let mut bearish_count = 0u32;
    let mut neutral_count = 0u32;

    let recent_news: Vec<NewsArticle> = results
        .iter()
        .take(SCORED_POSTS)
        .map(|post| {
            let votes = &post["votes"];
            let positive =
                votes["positive"].as_u64().unwrap_or(0) + votes["liked"].as_u64().unwrap_or(0);
            let negative =
                votes["negative"].as_u64().unwrap_or(0) + votes["disliked"].as_u64().unwrap_or(0);

            let sentiment = if positive as f64 > negative as f64 * 1.5 {
                bullish_count += 1;
                "positive"
            } else if negative as f64 > positive as f64 * 1.5 {
                bearish_count += 1;
                "negative"
            } else {
                neutral_count += 1;
                "neutral"
            };

            NewsArticle {
                title: post["title"].as_str().unwrap_or("").to_string(),
                url: post["url"].as_str().unwrap_or("").to_string(),
                published_at: post["published_at"].as_str().unwrap_or("").to_string(),
                sentiment: sentiment.to_string(),
                votes: ArticleVotes { positive, negative },
            }
        })
        .collect();

    let total_news = bullish_count + bearish_count + neutral_count;

    let score = if total_news > 0 {
        let imbalance = (bullish_count as f64 - bearish_count as f64) / total_news as f64;
        (imbalance * 50.0 + 50.0).round().clamp(0.0, 100.0)
    } else {
        50.0
    };

    let signal = if score >= 60.0 {
        SourceSignal::Bullish
    } else if score <= 40.0 {
        SourceSignal::Bearish
    } else {
        SourceSignal::Neutral
    };

    NewsSnapshot {
        score,
        signal,
        confidence: (total_news as f64 * 10.0).min(100.0),
        bullish_count,
        bearish_count,
        neutral_count,
        total_news,
        recent_news,
        cached: false,
        fetched_at: Utc::now().to_rfc3339(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn post(title: &str, positive: u64, liked: u64, negative: u64, disliked: u64) -> Value {
        json!({
            "title": title,
            "url": format!("https://example.com/{title}"),
            "published_at": "2024-03-01T12:00:00Z",
            "votes": {
                "positive": positive,
                "liked": liked,
                "negative": negative,
                "disliked": disliked
            }
        })
    }

    #[test]
    fn no_posts_is_neutral_with_zero_confidence() {
        let snapshot = build_snapshot(&[]);
        assert_eq!(snapshot.score, 50.0);
        assert_eq!(snapshot.signal, SourceSignal::Neutral);
        assert_eq!(snapshot.confidence, 0.0);
        assert_eq!(snapshot.total_news, 0);
        assert!(snapshot.recent_news.is_empty());
    }

    #[test]
    fn liked_votes_count_toward_positive() {
        // pos = 10 + 2 = 12, neg = 1: 12 > 1.5 makes this bullish.
        let posts = vec![post("etf-approved", 10, 2, 1, 0)];
        let snapshot = build_snapshot(&posts);

        assert_eq!(snapshot.bullish_count, 1);
        assert_eq!(snapshot.score, 100.0);
        assert_eq!(snapshot.signal, SourceSignal::Bullish);
        assert_eq!(snapshot.confidence, 10.0);
        assert_eq!(snapshot.recent_news[0].sentiment, "positive");
        assert_eq!(snapshot.recent_news[0].votes.positive, 12);
        assert_eq!(snapshot.recent_news[0].votes.negative, 1);
    }

    #[test]
    fn mixed_posts_round_toward_bullish() {
        // 2 bullish, 1 bearish, 1 neutral: (2 - 1) / 4 * 50 + 50 = 62.5,
        // rounded to 63, which clears the bullish threshold.
        let posts = vec![
            post("rally", 9, 0, 1, 0),
            post("upgrade", 6, 0, 0, 0),
            post("hack", 0, 0, 8, 1),
            post("sideways", 2, 0, 2, 0),
        ];
        let snapshot = build_snapshot(&posts);

        assert_eq!(snapshot.bullish_count, 2);
        assert_eq!(snapshot.bearish_count, 1);
        assert_eq!(snapshot.neutral_count, 1);
        assert_eq!(snapshot.score, 63.0);
        assert_eq!(snapshot.signal, SourceSignal::Bullish);
        assert_eq!(snapshot.confidence, 40.0);
    }

    #[test]
    fn bearish_dominance_scores_low() {
        let posts = vec![
            post("exploit", 0, 0, 9, 3),
            post("lawsuit", 1, 0, 7, 0),
            post("delisting", 0, 0, 4, 0),
        ];
        let snapshot = build_snapshot(&posts);

        assert_eq!(snapshot.bearish_count, 3);
        assert_eq!(snapshot.score, 0.0);
        assert_eq!(snapshot.signal, SourceSignal::Bearish);
    }

    #[test]
    fn exact_ratio_boundary_is_neutral() {
        // pos = 3, neg = 2: 3 is not strictly greater than 2 * 1.5.
        let posts = vec![post("contested", 3, 0, 2, 0)];
        let snapshot = build_snapshot(&posts);

        assert_eq!(snapshot.neutral_count, 1);
        assert_eq!(snapshot.recent_news[0].sentiment, "neutral");
    }

    #[test]
    fn only_the_first_ten_posts_are_scored() {
        let posts: Vec<Value> = (0..14).map(|i| post(&format!("p{i}"), 5, 0, 0, 0)).collect();
        let snapshot = build_snapshot(&posts);

        assert_eq!(snapshot.total_news, 10);
        assert_eq!(snapshot.recent_news.len(), 10);
        assert_eq!(snapshot.confidence, 100.0);
    }

    #[test]
    fn neutral_payload_shape() {
        let snapshot = NewsSnapshot::neutral();
        assert_eq!(snapshot.score, 50.0);
        assert_eq!(snapshot.total_news, 0);
        assert!(!snapshot.cached);
        assert!(!snapshot.fetched_at.is_empty());
    }
}
