//! Trading engine: validates and executes one order
//!
//! On pass, runs the CFD operation, applies the resulting delta through
//! the portfolio manager, records participant counters and returns the
//! trade. On reject, nothing mutates. Orders from one decision execute
//! in list order, so earlier orders consume margin and size budget
//! before later ones are validated.

use chrono::{DateTime, Utc};
use tracing::warn;
use types::competition::Competition;
use types::decision::{OrderOutcome, OrderRequest};
use types::ids::DecisionId;
use types::market::PriceMap;
use types::order::{Order, OrderAction, RejectReason};
use types::participant::Participant;
use types::portfolio::{Portfolio, PortfolioView};
use types::position::Position;
use types::trade::Trade;

use crate::portfolio::{self, PositionEffect};
use crate::validator;
use crate::{cfd, EngineError};

/// Mutable state one execution operates on. All of it belongs to a
/// single participant and is mutated inside that participant's lane.
pub struct ExecutionContext<'a> {
    pub competition: &'a Competition,
    pub participant: &'a mut Participant,
    pub portfolio: &'a mut Portfolio,
    pub positions: &'a mut Vec<Position>,
    pub prices: &'a PriceMap,
    pub now: DateTime<Utc>,
}

/// Per-order execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// The invocation this order came from, if any
    pub decision_id: Option<DecisionId>,
    /// Risk-monitor closes skip the activity rules (1–3) but keep the
    /// accounting path identical
    pub bypass_activity_checks: bool,
}

impl ExecutionOptions {
    pub fn for_decision(decision_id: DecisionId) -> Self {
        Self {
            decision_id: Some(decision_id),
            bypass_activity_checks: false,
        }
    }

    pub fn forced_liquidation() -> Self {
        Self {
            decision_id: None,
            bypass_activity_checks: true,
        }
    }
}

/// One executed or rejected order with its side effects.
#[derive(Debug, Clone)]
pub struct Execution {
    pub order: Order,
    pub trade: Option<Trade>,
    /// Portfolio view after the delta was applied (executions only)
    pub view: Option<PortfolioView>,
}

impl Execution {
    /// Compact per-order result recorded on the decision record.
    pub fn outcome(&self) -> OrderOutcome {
        OrderOutcome {
            order_id: self.order.id,
            status: self.order.status,
            reject_reason: self.order.reject_reason,
            executed_price: self.order.executed_price,
        }
    }

    fn rejected(mut order: Order, reason: RejectReason) -> Self {
        order.mark_rejected(reason);
        Self {
            order,
            trade: None,
            view: None,
        }
    }
}

/// Validate and execute a single order against current state.
///
/// Validation rejections come back as an [`Execution`] with a rejected
/// order and no mutation. Only accounting invariant violations surface
/// as `Err` — the caller must disqualify the participant.
pub fn execute_order(
    ctx: &mut ExecutionContext<'_>,
    request: &OrderRequest,
    opts: &ExecutionOptions,
) -> Result<Execution, EngineError> {
    let order = Order::from_request(ctx.participant.id, opts.decision_id, request, ctx.now);

    match request.action {
        OrderAction::Open => execute_open(ctx, request, order, opts),
        OrderAction::Close => execute_close(ctx, request, order, opts),
    }
}

fn execute_open(
    ctx: &mut ExecutionContext<'_>,
    request: &OrderRequest,
    mut order: Order,
    opts: &ExecutionOptions,
) -> Result<Execution, EngineError> {
    // The parser guarantees a side on open orders; reject defensively if
    // one slipped through without.
    let Some(side) = request.side else {
        warn!(order_id = %order.id, "open order arrived without a side");
        return Ok(Execution::rejected(order, RejectReason::QuantityNonPositive));
    };

    let view = portfolio::view(ctx.portfolio, ctx.positions);
    let admitted = match validator::validate_open(
        ctx.competition,
        ctx.participant,
        &view,
        ctx.prices,
        &request.symbol,
        request.quantity,
        request.leverage,
        ctx.now,
        opts.bypass_activity_checks,
    ) {
        Ok(admitted) => admitted,
        Err(reason) => return Ok(Execution::rejected(order, reason)),
    };

    let quantity = request.quantity.unwrap_or_default();
    let leverage = request.leverage.unwrap_or_default();
    let (position, delta) = cfd::open(
        ctx.portfolio.id,
        request.symbol.clone(),
        side,
        quantity,
        leverage,
        admitted.mark,
        ctx.now,
    )?;
    let margin = position.reserved_margin;

    let view = portfolio::apply(
        ctx.portfolio,
        ctx.positions,
        &delta,
        PositionEffect::Create(position),
        ctx.now,
    )?;

    order.mark_executed(admitted.mark, side, quantity);
    let trade = Trade {
        id: types::ids::TradeId::new(),
        participant_id: ctx.participant.id,
        order_id: order.id,
        action: OrderAction::Open,
        symbol: request.symbol.clone(),
        side,
        quantity,
        executed_price: admitted.mark,
        realized_pnl: None,
        margin_delta: margin,
        executed_at: ctx.now,
    };

    ctx.participant.record_trade(None);
    ctx.participant.update_equity(view.equity);

    Ok(Execution {
        order,
        trade: Some(trade),
        view: Some(view),
    })
}

fn execute_close(
    ctx: &mut ExecutionContext<'_>,
    request: &OrderRequest,
    mut order: Order,
    opts: &ExecutionOptions,
) -> Result<Execution, EngineError> {
    let admitted = match validator::validate_close(
        ctx.competition,
        ctx.participant,
        ctx.positions,
        ctx.prices,
        &request.symbol,
        request.position_id,
        ctx.now,
        opts.bypass_activity_checks,
    ) {
        Ok(admitted) => admitted,
        Err(reason) => return Ok(Execution::rejected(order, reason)),
    };

    // validate_close guarantees the position exists in this portfolio
    let Some(position) = ctx
        .positions
        .iter()
        .find(|p| p.id == admitted.position_id)
        .cloned()
    else {
        return Ok(Execution::rejected(order, RejectReason::PositionNotOwned));
    };

    let outcome = cfd::close(&position, admitted.mark)?;
    let view = portfolio::apply(
        ctx.portfolio,
        ctx.positions,
        &outcome.delta,
        PositionEffect::Remove(position.id),
        ctx.now,
    )?;

    // Closing a long sells, closing a short buys back
    let flow_side = position.side.opposite();
    order.mark_executed(outcome.executed_price, flow_side, position.quantity);
    let trade = Trade {
        id: types::ids::TradeId::new(),
        participant_id: ctx.participant.id,
        order_id: order.id,
        action: OrderAction::Close,
        symbol: position.symbol.clone(),
        side: flow_side,
        quantity: position.quantity,
        executed_price: outcome.executed_price,
        realized_pnl: Some(outcome.realized_pnl),
        margin_delta: -outcome.margin_released,
        executed_at: ctx.now,
    };

    ctx.participant.record_trade(Some(outcome.realized_pnl));
    ctx.participant.update_equity(view.equity);

    Ok(Execution {
        order,
        trade: Some(trade),
        view: Some(view),
    })
}
