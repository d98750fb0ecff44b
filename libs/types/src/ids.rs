//! Unique identifier types for arena entities
//!
//! All IDs use UUID v7 for time-sortable ordering, enabling chronological
//! queries over orders, trades and decision records without a separate
//! sequence column.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new id with the current timestamp embedded
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create from existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a competition
    CompetitionId
);
entity_id!(
    /// Unique identifier for a participant (one agent in one competition)
    ParticipantId
);
entity_id!(
    /// Unique identifier for a portfolio
    PortfolioId
);
entity_id!(
    /// Unique identifier for an open position
    PositionId
);
entity_id!(
    /// Unique identifier for an order
    OrderId
);
entity_id!(
    /// Unique identifier for a trade
    TradeId
);
entity_id!(
    /// Unique identifier for a decision record (one agent round)
    DecisionId
);

/// Instrument symbol as quoted by the market-data venue (e.g. "BTCUSDT")
///
/// Symbols are normalized to uppercase on construction so lookups are
/// insensitive to how the agent spelled them. Deserialization routes
/// through the same constructor, so a reply carrying `"btcusdt"` still
/// matches the allowed set and the price map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
