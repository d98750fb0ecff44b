//! Shared error taxonomy
//!
//! Validation rejections are *values* ([`crate::order::RejectReason`]),
//! not errors; the enums here cover state-machine misuse, bad arithmetic
//! inputs, and accounting invariant violations — the `internal_consistency`
//! class that must never happen in a healthy system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Entity state-machine and parameter errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("invalid competition window: starts_at {starts_at} must precede ends_at {ends_at}")]
    InvalidWindow {
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },

    #[error("invalid {field}: {detail}")]
    InvalidParameter {
        field: &'static str,
        detail: String,
    },

    #[error("invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

/// Bad inputs to the calculation primitives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("leverage must be positive, got {leverage}")]
    BadLeverage { leverage: Decimal },

    #[error("quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: Decimal },

    #[error("price must be positive, got {price}")]
    NonPositivePrice { price: Decimal },
}

/// Accounting invariant violations.
///
/// These abort the current execution, disqualify the participant and are
/// surfaced to operations logs; they never reach agents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("reserved margin drifted: portfolio carries {recorded}, open positions sum to {computed}")]
    MarginMismatch {
        recorded: Decimal,
        computed: Decimal,
    },

    #[error("reserved margin went negative: {value}")]
    NegativeReservedMargin { value: Decimal },

    #[error("cash went negative on open: {value}")]
    CashUnderflowOnOpen { value: Decimal },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_error_display() {
        let err = CalcError::BadLeverage {
            leverage: Decimal::ZERO,
        };
        assert_eq!(err.to_string(), "leverage must be positive, got 0");
    }

    #[test]
    fn test_consistency_error_display() {
        let err = ConsistencyError::MarginMismatch {
            recorded: Decimal::from(250),
            computed: Decimal::from(300),
        };
        assert!(err.to_string().contains("250"));
        assert!(err.to_string().contains("300"));
    }
}
