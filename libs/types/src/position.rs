//! Open CFD position tracking

use crate::ids::{PortfolioId, PositionId, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Position direction.
///
/// Serializes as "long"/"short"; deserialization also accepts the order
/// wire spellings "buy"/"sell" (case-insensitive) because model replies
/// use both interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Profits when price rises
    Long,
    /// Profits when price falls
    Short,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            other => Err(de::Error::custom(format!(
                "invalid side {other:?}: expected long/buy or short/sell"
            ))),
        }
    }
}

/// One open CFD leg.
///
/// `mark_price` and `unrealized_pnl` are refreshed on every price tick;
/// `reserved_margin` is fixed at open (`quantity × entry / leverage`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub portfolio_id: PortfolioId,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub mark_price: Decimal,
    /// Leverage chosen at open
    pub leverage: Decimal,
    pub reserved_margin: Decimal,
    pub unrealized_pnl: Decimal,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Current economic exposure: quantity × mark price.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.mark_price
    }

    /// Exposure at entry: quantity × entry price.
    pub fn entry_notional(&self) -> Decimal {
        self.quantity * self.entry_price
    }
}
