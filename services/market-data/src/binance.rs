//! Binance-style public REST ticker adapter

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;
use types::ids::Symbol;
use types::market::{PriceMap, PriceQuote};

use crate::source::{MarketDataError, MarketDataSource};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Public spot ticker endpoint, no credentials required.
pub struct BinanceSource {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    symbol: String,
    price: String,
}

impl BinanceSource {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(reqwest::Client::new(), DEFAULT_BASE_URL)
    }

    /// Decode one ticker payload into a price map, dropping entries that
    /// fail to parse (the venue occasionally lists non-numeric fields
    /// for delisted pairs).
    fn decode(entries: Vec<TickerEntry>, requested: &[Symbol]) -> PriceMap {
        let now = Utc::now();
        let mut out = PriceMap::new();
        for entry in entries {
            let symbol = Symbol::new(entry.symbol);
            if !requested.contains(&symbol) {
                continue;
            }
            match Decimal::from_str(&entry.price) {
                Ok(price) if price > Decimal::ZERO => {
                    out.insert(symbol, PriceQuote::new(price, now));
                }
                _ => {
                    warn!(symbol = %symbol, raw = %entry.price, "dropping unparsable ticker price");
                }
            }
        }
        out
    }
}

#[async_trait]
impl MarketDataSource for BinanceSource {
    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<PriceMap, MarketDataError> {
        // /api/v3/ticker/price?symbols=["BTCUSDT","ETHUSDT"]
        let list = symbols
            .iter()
            .map(|s| format!("\"{}\"", s.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/api/v3/ticker/price?symbols=[{}]", self.base_url, list);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketDataError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Venue {
                status: status.as_u16(),
                message,
            });
        }

        let entries: Vec<TickerEntry> =
            response.json().await.map_err(|e| MarketDataError::Decode {
                message: e.to_string(),
            })?;

        Ok(Self::decode(entries, symbols))
    }

    fn name(&self) -> &'static str {
        "binance"
    }
}
