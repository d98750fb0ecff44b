//! TTL price cache
//!
//! Readers take a shared lock over an immutable price book; each refresh
//! tick replaces the book in one write. A reader therefore never
//! observes a mix of old and new marks within one lookup, which is the
//! atomicity the repricing cycle depends on.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use types::ids::Symbol;
use types::market::{PriceMap, PriceQuote};

#[derive(Debug, Clone, Copy)]
struct StoredQuote {
    quote: PriceQuote,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct PriceBook {
    quotes: HashMap<Symbol, StoredQuote>,
    /// Monotonic publish counter, one per refresh tick
    tick: u64,
}

/// Shared price cache with a time-to-live on every entry.
#[derive(Debug)]
pub struct PriceCache {
    book: RwLock<PriceBook>,
    ttl: Duration,
}

impl PriceCache {
    /// Default TTL matching the venue refresh cadence.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    pub fn new(ttl: Duration) -> Self {
        Self {
            book: RwLock::new(PriceBook::default()),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }

    /// Publish one tick of quotes atomically. Existing entries for other
    /// symbols survive until their TTL expires.
    pub fn publish(&self, quotes: &PriceMap) -> u64 {
        let stored_at = Instant::now();
        let mut book = self.book.write();
        for (symbol, quote) in quotes {
            book.quotes.insert(
                symbol.clone(),
                StoredQuote {
                    quote: *quote,
                    stored_at,
                },
            );
        }
        book.tick += 1;
        debug!(tick = book.tick, quotes = quotes.len(), "price tick published");
        book.tick
    }

    /// Fresh quote for one symbol, or `None` if absent or expired.
    pub fn get(&self, symbol: &Symbol) -> Option<PriceQuote> {
        let book = self.book.read();
        book.quotes
            .get(symbol)
            .filter(|stored| stored.stored_at.elapsed() <= self.ttl)
            .map(|stored| stored.quote)
    }

    /// Fresh quotes for the requested symbols; expired or unknown
    /// symbols are absent from the result.
    pub fn snapshot(&self, symbols: &[Symbol]) -> PriceMap {
        let book = self.book.read();
        let mut out = PriceMap::new();
        for symbol in symbols {
            if let Some(stored) = book.quotes.get(symbol) {
                if stored.stored_at.elapsed() <= self.ttl {
                    out.insert(symbol.clone(), stored.quote);
                }
            }
        }
        out
    }

    /// Symbols among `symbols` that have no fresh quote.
    pub fn missing(&self, symbols: &[Symbol]) -> Vec<Symbol> {
        let book = self.book.read();
        symbols
            .iter()
            .filter(|symbol| {
                !book
                    .quotes
                    .get(symbol)
                    .is_some_and(|stored| stored.stored_at.elapsed() <= self.ttl)
            })
            .cloned()
            .collect()
    }

    /// Number of publishes since startup.
    pub fn tick(&self) -> u64 {
        self.book.read().tick
    }
}
