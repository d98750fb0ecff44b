//! Market-data quote types shared between the cache, the engine and the
//! decision orchestrator

use crate::ids::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest mid quote for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Decimal,
    pub as_of: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(price: Decimal, as_of: DateTime<Utc>) -> Self {
        Self { price, as_of }
    }
}

/// Price map for one refresh tick.
///
/// `BTreeMap` keeps iteration deterministic so prompts and snapshots
/// render identically for identical inputs.
pub type PriceMap = BTreeMap<Symbol, PriceQuote>;
