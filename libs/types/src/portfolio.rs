//! Portfolio: financial state of one participant
//!
//! The stored portfolio carries only the authoritative fields (cash,
//! reserved margin, cumulative realized P&L). Everything derived —
//! unrealized P&L, equity, available margin, leverage, margin level —
//! lives on [`PortfolioView`] and is recomputed by the engine from open
//! positions, never persisted.

use crate::ids::{ParticipantId, PortfolioId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Authoritative portfolio state.
///
/// Invariants (checked by the engine on every applied delta):
/// - `reserved_margin >= 0` and equals the sum of open-position margins
/// - `cash` is never driven negative by opening a position; realized
///   losses on closes may push it to zero or below, which the risk
///   monitor treats as a liquidation prelude
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub participant_id: ParticipantId,
    pub cash: Decimal,
    pub reserved_margin: Decimal,
    pub realized_pnl: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(participant_id: ParticipantId, initial_capital: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            id: PortfolioId::new(),
            participant_id,
            cash: initial_capital,
            reserved_margin: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            updated_at: now,
        }
    }
}

/// Fully derived read model of a portfolio at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub portfolio_id: PortfolioId,
    pub participant_id: ParticipantId,
    pub cash: Decimal,
    pub reserved_margin: Decimal,
    pub realized_pnl: Decimal,
    /// Σ unrealized P&L over open positions
    pub unrealized_pnl: Decimal,
    /// cash + unrealized P&L
    pub equity: Decimal,
    /// equity − reserved margin
    pub available_margin: Decimal,
    /// Σ position notional (at mark)
    pub total_notional: Decimal,
    /// Σ notional / equity, 0 when equity ≤ 0
    pub current_leverage: Decimal,
    /// equity / reserved margin in percent; `None` when no margin is used
    pub margin_level_pct: Option<Decimal>,
    pub open_positions: usize,
}
