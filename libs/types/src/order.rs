//! Order lifecycle types and validation reason codes

use crate::decision::OrderRequest;
use crate::ids::{DecisionId, OrderId, ParticipantId, PositionId, Symbol};
use crate::position::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the agent intends to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    Open,
    Close,
}

/// Order state. An order terminates as exactly one of executed or
/// rejected, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Executed,
}

/// Stable machine-readable rejection codes, one per validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ParticipantInactive,
    CompetitionInactive,
    InstrumentDisallowed,
    LeverageOutOfBounds,
    QuantityNonPositive,
    PriceUnavailable,
    SizeCapExceeded,
    InsufficientMargin,
    PositionNotOwned,
}

impl RejectReason {
    /// The wire code reported on execution results and REST responses.
    pub fn as_code(&self) -> &'static str {
        match self {
            RejectReason::ParticipantInactive => "participant_inactive",
            RejectReason::CompetitionInactive => "competition_inactive",
            RejectReason::InstrumentDisallowed => "instrument_disallowed",
            RejectReason::LeverageOutOfBounds => "leverage_out_of_bounds",
            RejectReason::QuantityNonPositive => "quantity_non_positive",
            RejectReason::PriceUnavailable => "price_unavailable",
            RejectReason::SizeCapExceeded => "size_cap_exceeded",
            RejectReason::InsufficientMargin => "insufficient_margin",
            RejectReason::PositionNotOwned => "position_not_owned",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

/// One intended action from an agent decision.
///
/// Open orders carry side/quantity/leverage from the wire; close orders
/// derive them from the referenced position at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub participant_id: ParticipantId,
    /// The invocation that emitted this order; `None` for risk-monitor
    /// synthesized closes.
    pub decision_id: Option<DecisionId>,
    pub action: OrderAction,
    pub symbol: Symbol,
    pub side: Option<Side>,
    pub quantity: Option<Decimal>,
    pub leverage: Option<Decimal>,
    pub position_id: Option<PositionId>,
    pub status: OrderStatus,
    pub reject_reason: Option<RejectReason>,
    pub executed_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn from_request(
        participant_id: ParticipantId,
        decision_id: Option<DecisionId>,
        request: &OrderRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            participant_id,
            decision_id,
            action: request.action,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            leverage: request.leverage,
            position_id: request.position_id,
            status: OrderStatus::Pending,
            reject_reason: None,
            executed_price: None,
            created_at: now,
        }
    }

    /// Terminal transition after all validation rules passed and the
    /// accounting delta was applied.
    pub fn mark_executed(&mut self, price: Decimal, side: Side, quantity: Decimal) {
        debug_assert!(matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::Accepted
        ));
        self.status = OrderStatus::Executed;
        self.executed_price = Some(price);
        // Backfill fields derived for closes so the audit trail is complete
        self.side = Some(side);
        self.quantity = Some(quantity);
    }

    /// Terminal transition on the first failing validation rule.
    pub fn mark_rejected(&mut self, reason: RejectReason) {
        debug_assert!(matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::Accepted
        ));
        self.status = OrderStatus::Rejected;
        self.reject_reason = Some(reason);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OrderStatus::Executed | OrderStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order() -> Order {
        Order::from_request(
            ParticipantId::new(),
            Some(DecisionId::new()),
            &OrderRequest {
                action: OrderAction::Open,
                symbol: Symbol::new("BTCUSDT"),
                side: Some(Side::Long),
                quantity: Some(Decimal::new(1, 2)),
                leverage: Some(Decimal::from(2)),
                position_id: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_order_starts_pending() {
        let order = make_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_terminal());
    }

    #[test]
    fn test_executed_is_terminal() {
        let mut order = make_order();
        order.mark_executed(Decimal::from(50_000), Side::Long, Decimal::new(1, 2));
        assert_eq!(order.status, OrderStatus::Executed);
        assert_eq!(order.executed_price, Some(Decimal::from(50_000)));
        assert!(order.reject_reason.is_none());
        assert!(order.is_terminal());
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut order = make_order();
        order.mark_rejected(RejectReason::InsufficientMargin);
        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(order.reject_reason, Some(RejectReason::InsufficientMargin));
        assert!(order.executed_price.is_none());
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(RejectReason::SizeCapExceeded.as_code(), "size_cap_exceeded");
        assert_eq!(
            serde_json::to_string(&RejectReason::PriceUnavailable).unwrap(),
            "\"price_unavailable\""
        );
    }
}
