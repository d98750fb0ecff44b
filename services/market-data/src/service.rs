//! Price service: cache in front of a venue adapter
//!
//! The scheduler pushes through `refresh` once per tick; everyone else
//! reads through `latest`, which serves the cache and pulls through to
//! the venue only for symbols with no fresh quote.

use std::sync::Arc;
use tracing::{debug, warn};
use types::ids::Symbol;
use types::market::PriceMap;

use crate::cache::PriceCache;
use crate::source::{MarketDataError, MarketDataSource};

pub struct PriceService {
    cache: PriceCache,
    source: Arc<dyn MarketDataSource>,
}

impl PriceService {
    pub fn new(cache: PriceCache, source: Arc<dyn MarketDataSource>) -> Self {
        Self { cache, source }
    }

    /// Fetch the given symbols from the venue and publish one tick.
    pub async fn refresh(&self, symbols: &[Symbol]) -> Result<PriceMap, MarketDataError> {
        if symbols.is_empty() {
            return Ok(PriceMap::new());
        }
        let quotes = self.source.latest_prices(symbols).await?;
        if quotes.len() < symbols.len() {
            warn!(
                venue = self.source.name(),
                requested = symbols.len(),
                received = quotes.len(),
                "venue returned fewer quotes than requested"
            );
        }
        self.cache.publish(&quotes);
        Ok(quotes)
    }

    /// Fresh quotes for the requested symbols, pulling through to the
    /// venue for anything expired or unknown. A venue failure on the
    /// pull-through degrades to whatever the cache still holds.
    pub async fn latest(&self, symbols: &[Symbol]) -> PriceMap {
        let missing = self.cache.missing(symbols);
        if !missing.is_empty() {
            match self.source.latest_prices(&missing).await {
                Ok(quotes) => {
                    self.cache.publish(&quotes);
                }
                Err(error) => {
                    warn!(venue = self.source.name(), %error, "pull-through fetch failed");
                }
            }
        } else {
            debug!(symbols = symbols.len(), "cache served all symbols");
        }
        self.cache.snapshot(symbols)
    }

    /// Non-blocking cache read, no venue traffic. Used at execute time
    /// where re-validation must see exactly the published marks.
    pub fn cached(&self, symbols: &[Symbol]) -> PriceMap {
        self.cache.snapshot(symbols)
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }
}
