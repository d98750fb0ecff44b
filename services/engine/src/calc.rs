//! Calculation primitives
//!
//! Pure, deterministic, side-effect-free decimal arithmetic used by every
//! higher layer. All rounding is bankers' rounding (midpoint-nearest-even)
//! at the scale of the containing field; values are never truncated.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use types::errors::CalcError;
use types::position::Side;

/// Scale of money and quantity fields (8 dp covers satoshi-grade
/// quantities and cents).
pub const MONEY_DP: u32 = 8;

/// Scale of percentages and ratios (leverage, margin level, returns).
pub const PCT_DP: u32 = 4;

/// Round to money scale with bankers' rounding.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven)
}

/// Round to percent/ratio scale with bankers' rounding.
pub fn round_pct(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PCT_DP, RoundingStrategy::MidpointNearestEven)
}

/// Economic exposure: `quantity × price`.
pub fn notional(quantity: Decimal, price: Decimal) -> Decimal {
    round_money(quantity * price)
}

/// Cash set aside to back a position: `notional / leverage`.
pub fn margin_required(notional: Decimal, leverage: Decimal) -> Result<Decimal, CalcError> {
    if leverage <= Decimal::ZERO {
        return Err(CalcError::BadLeverage { leverage });
    }
    Ok(round_money(notional / leverage))
}

/// Side-signed unrealized P&L.
///
/// Long:  `(mark − entry) × quantity`
/// Short: `(entry − mark) × quantity`
pub fn unrealized_pnl(side: Side, quantity: Decimal, entry: Decimal, mark: Decimal) -> Decimal {
    let pnl = match side {
        Side::Long => (mark - entry) * quantity,
        Side::Short => (entry - mark) * quantity,
    };
    round_money(pnl)
}

/// P&L as a percentage of `basis`; 0 when the basis is not positive.
pub fn pnl_pct(pnl: Decimal, basis: Decimal) -> Decimal {
    if basis > Decimal::ZERO {
        round_pct(pnl / basis * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    }
}

/// `cash + unrealized P&L`.
pub fn equity(cash: Decimal, unrealized: Decimal) -> Decimal {
    cash + unrealized
}

/// `Σ notional / equity`; 0 when equity is not positive.
pub fn current_leverage(total_notional: Decimal, equity: Decimal) -> Decimal {
    if equity > Decimal::ZERO {
        round_pct(total_notional / equity)
    } else {
        Decimal::ZERO
    }
}

/// Margin level in percent: `equity / reserved_margin × 100`.
///
/// Undefined (`None`) when no margin is reserved.
pub fn margin_level_pct(equity: Decimal, reserved_margin: Decimal) -> Option<Decimal> {
    if reserved_margin > Decimal::ZERO {
        Some(round_pct(equity / reserved_margin * Decimal::ONE_HUNDRED))
    } else {
        None
    }
}

/// Liquidation trigger: margin is in use and the margin level fell below
/// the maintenance threshold (percent points).
pub fn liquidation_triggered(
    equity: Decimal,
    reserved_margin: Decimal,
    maintenance_pct: Decimal,
) -> bool {
    match margin_level_pct(equity, reserved_margin) {
        Some(level) => level < maintenance_pct,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_notional() {
        // 0.01 BTC @ 50 000 = 500
        assert_eq!(notional(dec("0.01"), dec("50000")), dec("500"));
    }

    #[test]
    fn test_margin_required() {
        assert_eq!(
            margin_required(dec("500"), dec("2")).unwrap(),
            dec("250")
        );
        assert_eq!(
            margin_required(dec("500"), dec("1")).unwrap(),
            dec("500")
        );
    }

    #[test]
    fn test_margin_required_bad_leverage() {
        assert!(matches!(
            margin_required(dec("500"), Decimal::ZERO),
            Err(CalcError::BadLeverage { .. })
        ));
        assert!(margin_required(dec("500"), dec("-1")).is_err());
    }

    #[test]
    fn test_unrealized_pnl_long() {
        // Long 0.01 @ 50 000, mark 55 000 → +50
        assert_eq!(
            unrealized_pnl(Side::Long, dec("0.01"), dec("50000"), dec("55000")),
            dec("50")
        );
    }

    #[test]
    fn test_unrealized_pnl_short() {
        // Short 1 @ 100, mark 200 → −100
        assert_eq!(
            unrealized_pnl(Side::Short, dec("1"), dec("100"), dec("200")),
            dec("-100")
        );
    }

    #[test]
    fn test_pnl_pct() {
        assert_eq!(pnl_pct(dec("50"), dec("10000")), dec("0.5"));
        assert_eq!(pnl_pct(dec("50"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(pnl_pct(dec("50"), dec("-10")), Decimal::ZERO);
    }

    #[test]
    fn test_equity_and_leverage() {
        assert_eq!(equity(dec("10000"), dec("50")), dec("10050"));
        assert_eq!(current_leverage(dec("20000"), dec("10000")), dec("2"));
        assert_eq!(current_leverage(dec("20000"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(current_leverage(dec("20000"), dec("-5")), Decimal::ZERO);
    }

    #[test]
    fn test_margin_level() {
        // Equity 10 050, reserved 250 → 4020%
        assert_eq!(
            margin_level_pct(dec("10050"), dec("250")),
            Some(dec("4020"))
        );
        assert_eq!(margin_level_pct(dec("10050"), Decimal::ZERO), None);
    }

    #[test]
    fn test_liquidation_trigger_boundary() {
        // Level exactly at maintenance does not trigger; strictly below does
        assert!(!liquidation_triggered(dec("20"), dec("100"), dec("20")));
        assert!(liquidation_triggered(dec("19.99"), dec("100"), dec("20")));
        // No margin in use → never triggers
        assert!(!liquidation_triggered(dec("-50"), Decimal::ZERO, dec("20")));
    }

    #[test]
    fn test_bankers_rounding() {
        // Midpoints round to even at the target scale
        assert_eq!(round_money(dec("0.000000125")), dec("0.00000012"));
        assert_eq!(round_money(dec("0.000000135")), dec("0.00000014"));
        assert_eq!(round_pct(dec("1.00005")), dec("1"));
        assert_eq!(round_pct(dec("1.00015")), dec("1.0002"));
    }

    #[test]
    fn test_deterministic() {
        let a = margin_required(notional(dec("0.12345678"), dec("43210.98765")), dec("3")).unwrap();
        let b = margin_required(notional(dec("0.12345678"), dec("43210.98765")), dec("3")).unwrap();
        assert_eq!(a, b);
    }
}
