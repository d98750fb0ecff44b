//! Fixed-quote source for tests and offline runs

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use types::ids::Symbol;
use types::market::{PriceMap, PriceQuote};

use crate::source::{MarketDataError, MarketDataSource};

/// A settable in-memory quote table. Serves whatever was last `set`,
/// timestamped at call time, so tests can script price paths.
#[derive(Debug, Default)]
pub struct StaticSource {
    quotes: RwLock<HashMap<Symbol, Decimal>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, symbol: Symbol, price: Decimal) {
        self.quotes.write().insert(symbol, price);
    }

    pub fn remove(&self, symbol: &Symbol) {
        self.quotes.write().remove(symbol);
    }
}

#[async_trait]
impl MarketDataSource for StaticSource {
    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<PriceMap, MarketDataError> {
        let quotes = self.quotes.read();
        let now = Utc::now();
        Ok(symbols
            .iter()
            .filter_map(|symbol| {
                quotes
                    .get(symbol)
                    .map(|price| (symbol.clone(), PriceQuote::new(*price, now)))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
