//! Order validation pipeline
//!
//! A totally ordered rule list; the first failing rule yields the
//! rejection. Risk-monitor closes run with `bypass_activity_checks` set,
//! which skips the participant/competition/instrument rules (1–3) but
//! nothing else.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use types::competition::Competition;
use types::ids::{PositionId, Symbol};
use types::market::PriceMap;
use types::order::RejectReason;
use types::participant::Participant;
use types::portfolio::PortfolioView;
use types::position::Position;

use crate::calc;

/// Outcome of a passed open validation, carrying the figures the
/// execution step reuses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmittedOpen {
    pub mark: Decimal,
    pub notional: Decimal,
    pub margin_required: Decimal,
}

/// Outcome of a passed close validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmittedClose {
    pub position_id: PositionId,
    pub mark: Decimal,
}

/// Validate an open order.
///
/// Rule order:
/// 1. participant active
/// 2. competition active, inside its window, market open
/// 3. instrument allowed
/// 4. 0 < leverage ≤ max leverage
/// 5. quantity > 0
/// 6. fresh mark price available
/// 7. notional ≤ equity × size-cap% (leverage does not inflate the cap)
/// 8. required margin ≤ available margin
#[allow(clippy::too_many_arguments)]
pub fn validate_open(
    competition: &Competition,
    participant: &Participant,
    view: &PortfolioView,
    prices: &PriceMap,
    symbol: &Symbol,
    quantity: Option<Decimal>,
    leverage: Option<Decimal>,
    now: DateTime<Utc>,
    bypass_activity_checks: bool,
) -> Result<AdmittedOpen, RejectReason> {
    if !bypass_activity_checks {
        check_activity(competition, participant, symbol, now)?;
    }

    let leverage = leverage.ok_or(RejectReason::LeverageOutOfBounds)?;
    if leverage <= Decimal::ZERO || leverage > competition.max_leverage {
        return Err(RejectReason::LeverageOutOfBounds);
    }

    let quantity = quantity.ok_or(RejectReason::QuantityNonPositive)?;
    if quantity <= Decimal::ZERO {
        return Err(RejectReason::QuantityNonPositive);
    }

    let mark = fresh_price(prices, symbol)?;

    let notional = calc::notional(quantity, mark);
    let cap = calc::round_money(
        view.equity * competition.max_position_size_pct / Decimal::ONE_HUNDRED,
    );
    if notional > cap {
        return Err(RejectReason::SizeCapExceeded);
    }

    let margin = calc::margin_required(notional, leverage)
        .map_err(|_| RejectReason::LeverageOutOfBounds)?;
    if margin > view.available_margin {
        return Err(RejectReason::InsufficientMargin);
    }

    Ok(AdmittedOpen {
        mark,
        notional,
        margin_required: margin,
    })
}

/// Validate a close order.
///
/// Rules 1–3 as for open, then:
/// 4. the target position belongs to this portfolio — by id, or by
///    fallback when exactly one open position matches the symbol
/// 5. fresh mark price available for the position's symbol
#[allow(clippy::too_many_arguments)]
pub fn validate_close(
    competition: &Competition,
    participant: &Participant,
    positions: &[Position],
    prices: &PriceMap,
    symbol: &Symbol,
    position_id: Option<PositionId>,
    now: DateTime<Utc>,
    bypass_activity_checks: bool,
) -> Result<AdmittedClose, RejectReason> {
    if !bypass_activity_checks {
        check_activity(competition, participant, symbol, now)?;
    }

    let position = match position_id {
        Some(id) => positions.iter().find(|p| p.id == id),
        None => {
            let mut matching = positions.iter().filter(|p| &p.symbol == symbol);
            match (matching.next(), matching.next()) {
                (Some(p), None) => Some(p),
                // Zero or ambiguous matches: the agent must name the position
                _ => None,
            }
        }
    }
    .ok_or(RejectReason::PositionNotOwned)?;

    let mark = fresh_price(prices, &position.symbol)?;

    Ok(AdmittedClose {
        position_id: position.id,
        mark,
    })
}

/// Rules 1–3, shared by both actions.
fn check_activity(
    competition: &Competition,
    participant: &Participant,
    symbol: &Symbol,
    now: DateTime<Utc>,
) -> Result<(), RejectReason> {
    if !participant.is_active() {
        return Err(RejectReason::ParticipantInactive);
    }
    if !competition.accepts_orders_at(now) || !competition.market_open_at(now) {
        return Err(RejectReason::CompetitionInactive);
    }
    if !competition.allows(symbol) {
        return Err(RejectReason::InstrumentDisallowed);
    }
    Ok(())
}

/// Rule: a usable mark exists for the symbol.
fn fresh_price(prices: &PriceMap, symbol: &Symbol) -> Result<Decimal, RejectReason> {
    match prices.get(symbol) {
        Some(quote) if quote.price > Decimal::ZERO => Ok(quote.price),
        _ => Err(RejectReason::PriceUnavailable),
    }
}
