//! Market Data Service
//!
//! Supplies the arena with external mid quotes:
//! - `source`: the one-operation venue capability
//! - `binance`: public REST ticker adapter
//! - `fixture`: settable quote table for tests and offline runs
//! - `cache`: TTL price book with atomic per-tick publication
//! - `service`: cache-fronted lookup with pull-through

pub mod binance;
pub mod cache;
pub mod fixture;
pub mod service;
pub mod source;

pub use cache::PriceCache;
pub use service::PriceService;
pub use source::{MarketDataError, MarketDataSource};
