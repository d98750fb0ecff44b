//! Market-data capability
//!
//! The rest of the system consumes a single price-lookup operation; each
//! venue is one adapter behind this trait, injected at startup.

use async_trait::async_trait;
use types::ids::Symbol;
use types::market::PriceMap;

/// Errors surfaced by a venue adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    #[error("venue transport failed: {message}")]
    Transport { message: String },

    #[error("venue returned status {status}: {message}")]
    Venue { status: u16, message: String },

    #[error("could not decode venue payload: {message}")]
    Decode { message: String },
}

/// One market-data venue.
///
/// `latest_prices` returns a quote for every requested symbol the venue
/// knows; unknown symbols are simply absent from the map — staleness
/// handling is the cache's concern, not the adapter's.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<PriceMap, MarketDataError>;

    /// Venue tag used in logs.
    fn name(&self) -> &'static str;
}
