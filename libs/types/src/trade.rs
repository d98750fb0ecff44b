//! Trade: historical record of a state-changing execution

use crate::ids::{OrderId, ParticipantId, Symbol, TradeId};
use crate::order::OrderAction;
use crate::position::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One executed order, exactly one trade. Rejected orders never produce
/// a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub participant_id: ParticipantId,
    pub order_id: OrderId,
    pub action: OrderAction,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub executed_price: Decimal,
    /// Non-null only for closes
    pub realized_pnl: Option<Decimal>,
    /// Signed change to reserved margin (+ on open, − on close)
    pub margin_delta: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Economic exposure at execution: quantity × executed price.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.executed_price
    }
}
