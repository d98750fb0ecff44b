//! Portfolio manager: aggregation, delta application, repricing
//!
//! Owns the writable view of a portfolio and its open-position set.
//! Every applied delta re-checks the reserve-margin invariants; a
//! violation here means the engine itself is broken and the caller must
//! disqualify the participant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use types::errors::ConsistencyError;
use types::ids::PositionId;
use types::market::PriceMap;
use types::portfolio::{Portfolio, PortfolioView};
use types::position::Position;

use crate::calc;
use crate::cfd::{self, PortfolioDelta};

/// Position mutation applied together with a delta.
#[derive(Debug, Clone)]
pub enum PositionEffect {
    None,
    Create(Position),
    Remove(PositionId),
}

/// Recompute every derived field from authoritative state.
pub fn view(portfolio: &Portfolio, positions: &[Position]) -> PortfolioView {
    let unrealized: Decimal = positions.iter().map(|p| p.unrealized_pnl).sum();
    let total_notional: Decimal = positions.iter().map(|p| p.notional()).sum();
    let equity = calc::equity(portfolio.cash, unrealized);

    PortfolioView {
        portfolio_id: portfolio.id,
        participant_id: portfolio.participant_id,
        cash: portfolio.cash,
        reserved_margin: portfolio.reserved_margin,
        realized_pnl: portfolio.realized_pnl,
        unrealized_pnl: unrealized,
        equity,
        available_margin: equity - portfolio.reserved_margin,
        total_notional,
        current_leverage: calc::current_leverage(total_notional, equity),
        margin_level_pct: calc::margin_level_pct(equity, portfolio.reserved_margin),
        open_positions: positions.len(),
    }
}

/// Atomically apply a CFD delta plus its position effect.
///
/// Checked invariants after mutation:
/// - reserved margin never negative
/// - reserved margin equals the sum of open-position margins
/// - cash untouched by margin-only deltas (opens cannot drain cash)
pub fn apply(
    portfolio: &mut Portfolio,
    positions: &mut Vec<Position>,
    delta: &PortfolioDelta,
    effect: PositionEffect,
    now: DateTime<Utc>,
) -> Result<PortfolioView, ConsistencyError> {
    portfolio.cash += delta.cash;
    portfolio.reserved_margin += delta.reserved_margin;
    portfolio.realized_pnl += delta.realized_pnl;
    portfolio.updated_at = now;

    match effect {
        PositionEffect::None => {}
        PositionEffect::Create(position) => positions.push(position),
        PositionEffect::Remove(id) => positions.retain(|p| p.id != id),
    }

    if portfolio.reserved_margin < Decimal::ZERO {
        return Err(ConsistencyError::NegativeReservedMargin {
            value: portfolio.reserved_margin,
        });
    }

    let computed: Decimal = positions.iter().map(|p| p.reserved_margin).sum();
    if portfolio.reserved_margin != computed {
        return Err(ConsistencyError::MarginMismatch {
            recorded: portfolio.reserved_margin,
            computed,
        });
    }

    if delta.cash == Decimal::ZERO
        && delta.reserved_margin > Decimal::ZERO
        && portfolio.cash < Decimal::ZERO
    {
        return Err(ConsistencyError::CashUnderflowOnOpen {
            value: portfolio.cash,
        });
    }

    Ok(view(portfolio, positions))
}

/// Reprice every position whose symbol appears in `prices`.
///
/// Returns the number of positions updated. The caller publishes the
/// whole price map in one tick, so a portfolio never mixes old and new
/// marks within one call.
pub fn reprice_all(positions: &mut [Position], prices: &PriceMap) -> usize {
    let mut updated = 0;
    for position in positions.iter_mut() {
        if let Some(quote) = prices.get(&position.symbol) {
            cfd::reprice(position, quote.price);
            updated += 1;
        }
    }
    updated
}
