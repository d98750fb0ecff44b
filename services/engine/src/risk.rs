//! Risk monitor primitives
//!
//! Runs after every reprice: decide whether a portfolio must be
//! flattened and, if so, in what order. The actual closes go through the
//! trading engine with activity checks bypassed, so liquidation reuses
//! the exact accounting path of ordinary closes.

use rust_decimal::Decimal;
use types::decision::OrderRequest;
use types::order::OrderAction;
use types::portfolio::PortfolioView;
use types::position::Position;

use crate::calc;

/// Whether the portfolio has crossed the liquidation threshold.
///
/// Triggers when margin is in use and the margin level fell below the
/// maintenance threshold, or when equity is exhausted outright.
pub fn liquidation_required(view: &PortfolioView, maintenance_pct: Decimal) -> bool {
    calc::liquidation_triggered(view.equity, view.reserved_margin, maintenance_pct)
        || view.equity <= Decimal::ZERO
}

/// Synthesize close orders for every open position, largest notional
/// first so the most exposure unwinds earliest.
pub fn forced_close_requests(positions: &[Position]) -> Vec<OrderRequest> {
    let mut by_notional: Vec<&Position> = positions.iter().collect();
    by_notional.sort_by(|a, b| b.notional().cmp(&a.notional()).then(a.id.cmp(&b.id)));

    by_notional
        .into_iter()
        .map(|position| OrderRequest {
            action: OrderAction::Close,
            symbol: position.symbol.clone(),
            side: None,
            quantity: None,
            leverage: None,
            position_id: Some(position.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::{ParticipantId, PortfolioId, Symbol};
    use types::portfolio::Portfolio;
    use types::position::Side;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn make_view(cash: &str, reserved: &str, unrealized: &str) -> PortfolioView {
        let participant_id = ParticipantId::new();
        let mut portfolio = Portfolio::new(participant_id, dec(cash), Utc::now());
        portfolio.reserved_margin = dec(reserved);
        let mut view = crate::portfolio::view(&portfolio, &[]);
        // Inject unrealized P&L the way a repriced position set would
        view.unrealized_pnl = dec(unrealized);
        view.equity = view.cash + view.unrealized_pnl;
        view.available_margin = view.equity - view.reserved_margin;
        view.margin_level_pct = calc::margin_level_pct(view.equity, view.reserved_margin);
        view
    }

    fn make_position(symbol: &str, qty: &str, mark: &str) -> Position {
        let (mut position, _) = crate::cfd::open(
            PortfolioId::new(),
            Symbol::new(symbol),
            Side::Short,
            dec(qty),
            dec("10"),
            dec(mark),
            Utc::now(),
        )
        .unwrap();
        crate::cfd::reprice(&mut position, dec(mark));
        position
    }

    #[test]
    fn test_healthy_portfolio_not_liquidated() {
        // Equity 10 050, reserved 250 → level 4020% ≫ 20%
        let view = make_view("10000", "250", "50");
        assert!(!liquidation_required(&view, dec("20")));
    }

    #[test]
    fn test_margin_level_below_maintenance_triggers() {
        // Cash 1 000, reserved 10, unrealized −1 100 → equity −100
        let view = make_view("1000", "10", "-1100");
        assert!(liquidation_required(&view, dec("20")));
    }

    #[test]
    fn test_exhausted_equity_triggers_even_without_margin() {
        let view = make_view("-50", "0", "0");
        assert!(liquidation_required(&view, dec("20")));
    }

    #[test]
    fn test_forced_closes_ordered_by_descending_notional() {
        let small = make_position("ETHUSDT", "1", "3000"); // 3 000
        let large = make_position("BTCUSDT", "1", "50000"); // 50 000
        let mid = make_position("SOLUSDT", "100", "150"); // 15 000

        let requests = forced_close_requests(&[small.clone(), large.clone(), mid.clone()]);
        let ids: Vec<_> = requests.iter().map(|r| r.position_id.unwrap()).collect();
        assert_eq!(ids, vec![large.id, mid.id, small.id]);

        for request in &requests {
            assert_eq!(request.action, OrderAction::Close);
            assert!(request.side.is_none());
            assert!(request.quantity.is_none());
        }
    }
}
