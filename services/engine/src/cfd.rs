//! CFD engine: opens, closes and reprices a single position
//!
//! Accounting follows the reserve-margin model: opening a position moves
//! no cash, it only sets margin aside; equity moves with marks and with
//! realized outcomes on close.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use types::errors::CalcError;
use types::ids::{PortfolioId, PositionId, Symbol};
use types::position::{Position, Side};

use crate::calc;

/// Signed changes a CFD operation makes to portfolio state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioDelta {
    pub cash: Decimal,
    pub reserved_margin: Decimal,
    pub realized_pnl: Decimal,
}

impl PortfolioDelta {
    pub fn zero() -> Self {
        Self {
            cash: Decimal::ZERO,
            reserved_margin: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
        }
    }
}

/// Result of closing one position.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutcome {
    pub realized_pnl: Decimal,
    pub executed_price: Decimal,
    pub margin_released: Decimal,
    pub delta: PortfolioDelta,
}

/// Open a position at the given mark.
///
/// Emits `Δcash = 0`, `Δreserved_margin = +margin`, `Δrealized = 0`:
/// opening must not perturb equity.
pub fn open(
    portfolio_id: PortfolioId,
    symbol: Symbol,
    side: Side,
    quantity: Decimal,
    leverage: Decimal,
    mark_price: Decimal,
    now: DateTime<Utc>,
) -> Result<(Position, PortfolioDelta), CalcError> {
    if quantity <= Decimal::ZERO {
        return Err(CalcError::NonPositiveQuantity { quantity });
    }
    if mark_price <= Decimal::ZERO {
        return Err(CalcError::NonPositivePrice { price: mark_price });
    }

    let notional = calc::notional(quantity, mark_price);
    let margin = calc::margin_required(notional, leverage)?;

    let position = Position {
        id: PositionId::new(),
        portfolio_id,
        symbol,
        side,
        quantity,
        entry_price: mark_price,
        mark_price,
        leverage,
        reserved_margin: margin,
        unrealized_pnl: Decimal::ZERO,
        opened_at: now,
    };

    let delta = PortfolioDelta {
        cash: Decimal::ZERO,
        reserved_margin: margin,
        realized_pnl: Decimal::ZERO,
    };

    Ok((position, delta))
}

/// Close a position at the given mark.
///
/// Emits `Δcash = +realized`, `Δreserved_margin = −position.margin`,
/// `Δrealized = +realized`. The close executes at `mark_price` exactly.
pub fn close(position: &Position, mark_price: Decimal) -> Result<CloseOutcome, CalcError> {
    if mark_price <= Decimal::ZERO {
        return Err(CalcError::NonPositivePrice { price: mark_price });
    }

    let realized = calc::unrealized_pnl(
        position.side,
        position.quantity,
        position.entry_price,
        mark_price,
    );

    Ok(CloseOutcome {
        realized_pnl: realized,
        executed_price: mark_price,
        margin_released: position.reserved_margin,
        delta: PortfolioDelta {
            cash: realized,
            reserved_margin: -position.reserved_margin,
            realized_pnl: realized,
        },
    })
}

/// Update the mark and recompute unrealized P&L. No cash or margin moves.
pub fn reprice(position: &mut Position, mark_price: Decimal) {
    debug_assert!(mark_price > Decimal::ZERO);
    position.mark_price = mark_price;
    position.unrealized_pnl = calc::unrealized_pnl(
        position.side,
        position.quantity,
        position.entry_price,
        mark_price,
    );
}
