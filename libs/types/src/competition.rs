//! Competition rule-set and time window

use crate::errors::StateError;
use crate::ids::{CompetitionId, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Competition lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    /// Created but not yet running
    Pending,
    /// Running; participants are invoked on schedule
    Active,
    /// Finished (end of window or manual stop)
    Completed,
    /// Abandoned before completion
    Cancelled,
}

/// Parameters supplied when creating a competition.
///
/// Percentages are percent points: `max_position_size_pct = 50` means a
/// single position may not exceed 50% of current equity, and
/// `maintenance_margin_pct = 20` liquidates when margin level falls
/// below 20%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionParams {
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub initial_capital: Decimal,
    pub max_leverage: Decimal,
    pub max_position_size_pct: Decimal,
    pub margin_requirement_pct: Decimal,
    pub maintenance_margin_pct: Decimal,
    pub invocation_interval_minutes: u32,
    pub allowed_symbols: BTreeSet<Symbol>,
    pub max_participants: u32,
    pub market_hours_only: bool,
}

/// The rule-set and time window of one contest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    pub status: CompetitionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Cash every participant starts with
    pub initial_capital: Decimal,
    pub max_leverage: Decimal,
    /// Per-position notional cap as % of current equity
    pub max_position_size_pct: Decimal,
    /// Informational initial-margin floor surfaced to agents
    pub margin_requirement_pct: Decimal,
    /// Margin level (%) below which portfolios are force-flattened
    pub maintenance_margin_pct: Decimal,
    pub invocation_interval_minutes: u32,
    pub allowed_symbols: BTreeSet<Symbol>,
    pub max_participants: u32,
    pub market_hours_only: bool,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    /// Create a pending competition, validating the rule-set.
    pub fn new(params: CompetitionParams, now: DateTime<Utc>) -> Result<Self, StateError> {
        if params.starts_at >= params.ends_at {
            return Err(StateError::InvalidWindow {
                starts_at: params.starts_at,
                ends_at: params.ends_at,
            });
        }
        if params.initial_capital <= Decimal::ZERO {
            return Err(StateError::InvalidParameter {
                field: "initial_capital",
                detail: "must be positive".into(),
            });
        }
        if params.max_leverage <= Decimal::ZERO {
            return Err(StateError::InvalidParameter {
                field: "max_leverage",
                detail: "must be positive".into(),
            });
        }
        if params.invocation_interval_minutes == 0 {
            return Err(StateError::InvalidParameter {
                field: "invocation_interval_minutes",
                detail: "must be at least 1".into(),
            });
        }
        if params.allowed_symbols.is_empty() {
            return Err(StateError::InvalidParameter {
                field: "allowed_symbols",
                detail: "at least one instrument required".into(),
            });
        }

        Ok(Self {
            id: CompetitionId::new(),
            name: params.name,
            status: CompetitionStatus::Pending,
            starts_at: params.starts_at,
            ends_at: params.ends_at,
            initial_capital: params.initial_capital,
            max_leverage: params.max_leverage,
            max_position_size_pct: params.max_position_size_pct,
            margin_requirement_pct: params.margin_requirement_pct,
            maintenance_margin_pct: params.maintenance_margin_pct,
            invocation_interval_minutes: params.invocation_interval_minutes,
            allowed_symbols: params.allowed_symbols,
            max_participants: params.max_participants,
            market_hours_only: params.market_hours_only,
            created_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, CompetitionStatus::Active)
    }

    /// Whether orders may be admitted at `now`: status active and inside
    /// the start/end window.
    pub fn accepts_orders_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now >= self.starts_at && now < self.ends_at
    }

    pub fn allows(&self, symbol: &Symbol) -> bool {
        self.allowed_symbols.contains(symbol)
    }

    /// Whether trading is open at `now` under the market-hours flag.
    ///
    /// Crypto competitions run 24/7 (`market_hours_only = false`).
    /// Equity-style competitions trade weekdays 13:30–20:00 UTC
    /// (regular US cash session).
    pub fn market_open_at(&self, now: DateTime<Utc>) -> bool {
        use chrono::{Datelike, Timelike, Weekday};

        if !self.market_hours_only {
            return true;
        }
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let minute_of_day = now.hour() * 60 + now.minute();
        (13 * 60 + 30..20 * 60).contains(&minute_of_day)
    }

    /// Transition pending → active (scheduled start or manual).
    pub fn start(&mut self) -> Result<(), StateError> {
        match self.status {
            CompetitionStatus::Pending => {
                self.status = CompetitionStatus::Active;
                Ok(())
            }
            status => Err(StateError::InvalidTransition {
                entity: "competition",
                from: format!("{status:?}"),
                to: "active".into(),
            }),
        }
    }

    /// Transition active → completed (end of window or manual stop).
    pub fn complete(&mut self) -> Result<(), StateError> {
        match self.status {
            CompetitionStatus::Active => {
                self.status = CompetitionStatus::Completed;
                Ok(())
            }
            status => Err(StateError::InvalidTransition {
                entity: "competition",
                from: format!("{status:?}"),
                to: "completed".into(),
            }),
        }
    }

    /// Cancel a competition that never completed.
    pub fn cancel(&mut self) -> Result<(), StateError> {
        match self.status {
            CompetitionStatus::Pending | CompetitionStatus::Active => {
                self.status = CompetitionStatus::Cancelled;
                Ok(())
            }
            status => Err(StateError::InvalidTransition {
                entity: "competition",
                from: format!("{status:?}"),
                to: "cancelled".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_params() -> CompetitionParams {
        CompetitionParams {
            name: "alpha-cup".into(),
            starts_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            initial_capital: Decimal::from(10_000),
            max_leverage: Decimal::from(10),
            max_position_size_pct: Decimal::from(50),
            margin_requirement_pct: Decimal::from(10),
            maintenance_margin_pct: Decimal::from(20),
            invocation_interval_minutes: 60,
            allowed_symbols: [Symbol::new("BTCUSDT"), Symbol::new("ETHUSDT")]
                .into_iter()
                .collect(),
            max_participants: 16,
            market_hours_only: false,
        }
    }

    #[test]
    fn test_new_competition_is_pending() {
        let c = Competition::new(make_params(), Utc::now()).unwrap();
        assert_eq!(c.status, CompetitionStatus::Pending);
        assert!(!c.is_active());
    }

    #[test]
    fn test_window_must_be_ordered() {
        let mut params = make_params();
        params.ends_at = params.starts_at;
        let err = Competition::new(params, Utc::now()).unwrap_err();
        assert!(matches!(err, StateError::InvalidWindow { .. }));
    }

    #[test]
    fn test_empty_symbols_rejected() {
        let mut params = make_params();
        params.allowed_symbols.clear();
        assert!(Competition::new(params, Utc::now()).is_err());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut c = Competition::new(make_params(), Utc::now()).unwrap();
        c.start().unwrap();
        assert!(c.is_active());
        c.complete().unwrap();
        assert_eq!(c.status, CompetitionStatus::Completed);

        // Completed is terminal
        assert!(c.start().is_err());
        assert!(c.cancel().is_err());
    }

    #[test]
    fn test_accepts_orders_respects_window() {
        let mut c = Competition::new(make_params(), Utc::now()).unwrap();
        c.start().unwrap();

        let inside = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        assert!(c.accepts_orders_at(inside));
        assert!(!c.accepts_orders_at(before));
        assert!(!c.accepts_orders_at(after));
    }

    #[test]
    fn test_market_hours_gate() {
        let mut params = make_params();
        params.market_hours_only = true;
        let c = Competition::new(params, Utc::now()).unwrap();

        // Wednesday 15:00 UTC — open
        let weekday_open = Utc.with_ymd_and_hms(2025, 1, 15, 15, 0, 0).unwrap();
        // Wednesday 21:00 UTC — after close
        let weekday_closed = Utc.with_ymd_and_hms(2025, 1, 15, 21, 0, 0).unwrap();
        // Saturday
        let weekend = Utc.with_ymd_and_hms(2025, 1, 18, 15, 0, 0).unwrap();

        assert!(c.market_open_at(weekday_open));
        assert!(!c.market_open_at(weekday_closed));
        assert!(!c.market_open_at(weekend));

        // 24/7 competitions ignore the clock
        let c24 = Competition::new(make_params(), Utc::now()).unwrap();
        assert!(c24.market_open_at(weekend));
    }

    #[test]
    fn test_allows_symbol() {
        let c = Competition::new(make_params(), Utc::now()).unwrap();
        assert!(c.allows(&Symbol::new("btcusdt")));
        assert!(!c.allows(&Symbol::new("DOGEUSDT")));
    }
}
