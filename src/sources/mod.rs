// =============================================================================
// Data Sources Module
// =============================================================================
//
// One sub-module per upstream provider, each producing a typed, cached
// payload ready for both the REST surface and the prediction engine:
//
//   1. Price History   — CoinGecko market chart (the only required source)
//   2. News Sentiment  — CryptoPanic hot posts, vote-classified
//   3. Funding Rate    — Binance perpetual funding, contrarian ladder
//   4. Market Metrics  — Binance top-trader long/short positioning
//   5. Fear & Greed    — Alternative.me market-wide sentiment index
//
// Every fetcher caches through `TtlCache`, counts its upstream calls against
// the `UsageMonitor`, and degrades to a neutral payload where the provider
// cannot know the coin (no futures contract, no API key).

pub mod fear_greed;
pub mod funding;
pub mod market;
pub mod news;
pub mod prices;

pub use fear_greed::{FearGreedSnapshot, FearGreedTracker};
pub use funding::{FundingRateMonitor, FundingSnapshot};
pub use market::{MarketMetricsMonitor, MarketSnapshot};
pub use news::{NewsArticle, NewsSentimentMonitor, NewsSnapshot};
pub use prices::{PriceHistory, PriceHistoryProvider};

use std::collections::HashMap;

/// CoinGecko coin ids with a liquid Binance USDT-margined perpetual.
/// Coins outside this table get neutral funding and positioning payloads.
const FUTURES_SYMBOLS: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSDT"),
    ("ethereum", "ETHUSDT"),
    ("binancecoin", "BNBUSDT"),
    ("ripple", "XRPUSDT"),
    ("cardano", "ADAUSDT"),
    ("solana", "SOLUSDT"),
    ("dogecoin", "DOGEUSDT"),
    ("polkadot", "DOTUSDT"),
    ("polygon", "MATICUSDT"),
    ("shiba-inu", "SHIBUSDT"),
    ("avalanche-2", "AVAXUSDT"),
    ("chainlink", "LINKUSDT"),
    ("uniswap", "UNIUSDT"),
    ("litecoin", "LTCUSDT"),
    ("monero", "XMRUSDT"),
    ("stellar", "XLMUSDT"),
    ("cosmos", "ATOMUSDT"),
    ("algorand", "ALGOUSDT"),
    ("vechain", "VETUSDT"),
    ("filecoin", "FILUSDT"),
    ("tron", "TRXUSDT"),
    ("aptos", "APTUSDT"),
    ("arbitrum", "ARBUSDT"),
    ("optimism", "OPUSDT"),
    ("near", "NEARUSDT"),
    ("apecoin", "APEUSDT"),
    ("sandbox", "SANDUSDT"),
    ("decentraland", "MANAUSDT"),
    ("axie-infinity", "AXSUSDT"),
    ("gala", "GALAUSDT"),
];

/// CoinGecko coin ids to the ticker CryptoPanic indexes news under.
const NEWS_TICKERS: &[(&str, &str)] = &[
    ("bitcoin", "BTC"),
    ("ethereum", "ETH"),
    ("binancecoin", "BNB"),
    ("ripple", "XRP"),
    ("cardano", "ADA"),
    ("solana", "SOL"),
    ("dogecoin", "DOGE"),
    ("polkadot", "DOT"),
    ("polygon", "MATIC"),
    ("shiba-inu", "SHIB"),
    ("avalanche", "AVAX"),
    ("chainlink", "LINK"),
    ("uniswap", "UNI"),
    ("litecoin", "LTC"),
    ("monero", "XMR"),
];

/// Coin-id lookup table, extendable at runtime from configuration.
pub struct SymbolTable {
    extra: HashMap<String, String>,
}

impl SymbolTable {
    /// Built-in table only.
    pub fn new() -> Self {
        Self {
            extra: HashMap::new(),
        }
    }

    /// Built-in table with configured overrides layered on top.
    pub fn with_extra(extra: HashMap<String, String>) -> Self {
        Self { extra }
    }

    /// Binance futures symbol for a CoinGecko coin id, if one exists.
    pub fn futures_symbol(&self, coin_id: &str) -> Option<&str> {
        if let Some(symbol) = self.extra.get(coin_id) {
            return Some(symbol.as_str());
        }
        FUTURES_SYMBOLS
            .iter()
            .find(|(id, _)| *id == coin_id)
            .map(|(_, symbol)| *symbol)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticker CryptoPanic indexes a coin under. Unknown ids fall back to the
/// uppercased id truncated to five characters, which matches most tickers
/// closely enough for a news search.
pub fn news_ticker(coin_id: &str) -> String {
    if let Some((_, ticker)) = NEWS_TICKERS.iter().find(|(id, _)| *id == coin_id) {
        return (*ticker).to_string();
    }
    coin_id.to_uppercase().chars().take(5).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn futures_symbols_resolve() {
        let table = SymbolTable::new();
        assert_eq!(table.futures_symbol("bitcoin"), Some("BTCUSDT"));
        assert_eq!(table.futures_symbol("avalanche-2"), Some("AVAXUSDT"));
        assert_eq!(table.futures_symbol("gala"), Some("GALAUSDT"));
        assert_eq!(table.futures_symbol("some-microcap"), None);
    }

    #[test]
    fn extra_symbols_override_builtins() {
        let mut extra = HashMap::new();
        extra.insert("sui".to_string(), "SUIUSDT".to_string());
        extra.insert("bitcoin".to_string(), "BTCUSDC".to_string());

        let table = SymbolTable::with_extra(extra);
        assert_eq!(table.futures_symbol("sui"), Some("SUIUSDT"));
        assert_eq!(table.futures_symbol("bitcoin"), Some("BTCUSDC"));
        assert_eq!(table.futures_symbol("ethereum"), Some("ETHUSDT"));
    }

    #[test]
    fn news_tickers_resolve() {
        assert_eq!(news_ticker("bitcoin"), "BTC");
        assert_eq!(news_ticker("dogecoin"), "DOGE");
    }

    #[test]
    fn unknown_news_ticker_falls_back_to_truncated_id() {
        assert_eq!(news_ticker("pepe"), "PEPE");
        assert_eq!(news_ticker("worldcoin-wld"), "WORLD");
    }

    #[test]
    fn futures_table_has_no_duplicate_ids() {
        let mut ids: Vec<&str> = FUTURES_SYMBOLS.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), FUTURES_SYMBOLS.len());
    }
}
