//! Participant: one agent enrolled in one competition

use crate::errors::StateError;
use crate::ids::{CompetitionId, ParticipantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Participant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Trading; woken on every decision tick
    Active,
    /// Force-flattened by the risk monitor (terminal)
    Liquidated,
    /// Removed after an accounting invariant violation (terminal)
    Disqualified,
    /// Left the competition voluntarily (terminal)
    Withdrawn,
}

/// Parameters supplied when enrolling an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantParams {
    pub name: String,
    /// Provider tag resolved against the model registry (e.g. "anthropic")
    pub provider: String,
    /// Provider-specific model identifier
    pub model: String,
    /// Opaque provider configuration (temperature, max tokens, ...)
    #[serde(default)]
    pub model_config: serde_json::Value,
    /// Hard wall-clock bound on one model invocation
    pub invocation_timeout_secs: u32,
}

/// One agent enrolled in one competition.
///
/// Exclusively owns exactly one portfolio; `current_equity` and
/// `peak_equity` mirror the portfolio so leaderboards never recompute
/// from positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub competition_id: CompetitionId,
    pub name: String,
    pub provider: String,
    pub model: String,
    pub model_config: serde_json::Value,
    pub invocation_timeout_secs: u32,
    pub status: ParticipantStatus,
    pub current_equity: Decimal,
    pub peak_equity: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(
        competition_id: CompetitionId,
        params: ParticipantParams,
        initial_capital: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ParticipantId::new(),
            competition_id,
            name: params.name,
            provider: params.provider,
            model: params.model,
            model_config: params.model_config,
            invocation_timeout_secs: params.invocation_timeout_secs,
            status: ParticipantStatus::Active,
            current_equity: initial_capital,
            peak_equity: initial_capital,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, ParticipantStatus::Active)
    }

    /// Record an executed trade. A close carries its realized P&L; a
    /// winning trade closed strictly above breakeven, a losing one
    /// strictly below. Opens count toward `total_trades` only.
    pub fn record_trade(&mut self, realized_pnl: Option<Decimal>) {
        self.total_trades += 1;
        if let Some(pnl) = realized_pnl {
            if pnl > Decimal::ZERO {
                self.winning_trades += 1;
            } else if pnl < Decimal::ZERO {
                self.losing_trades += 1;
            }
        }
    }

    /// Track equity after every applied delta or reprice.
    pub fn update_equity(&mut self, equity: Decimal) {
        self.current_equity = equity;
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Terminal transition applied by the risk monitor.
    pub fn liquidate(&mut self) -> Result<(), StateError> {
        self.transition(ParticipantStatus::Liquidated, "liquidated")
    }

    /// Terminal transition applied after an invariant violation.
    pub fn disqualify(&mut self) -> Result<(), StateError> {
        self.transition(ParticipantStatus::Disqualified, "disqualified")
    }

    pub fn withdraw(&mut self) -> Result<(), StateError> {
        self.transition(ParticipantStatus::Withdrawn, "withdrawn")
    }

    fn transition(&mut self, to: ParticipantStatus, label: &'static str) -> Result<(), StateError> {
        if !self.is_active() {
            return Err(StateError::InvalidTransition {
                entity: "participant",
                from: format!("{:?}", self.status),
                to: label.into(),
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_participant() -> Participant {
        Participant::new(
            CompetitionId::new(),
            ParticipantParams {
                name: "claude-runner".into(),
                provider: "anthropic".into(),
                model: "claude-sonnet-4".into(),
                model_config: serde_json::json!({ "temperature": 0.7 }),
                invocation_timeout_secs: 120,
            },
            Decimal::from(10_000),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_participant_active_with_initial_equity() {
        let p = make_participant();
        assert!(p.is_active());
        assert_eq!(p.current_equity, Decimal::from(10_000));
        assert_eq!(p.peak_equity, Decimal::from(10_000));
        assert_eq!(p.total_trades, 0);
    }

    #[test]
    fn test_record_trade_counters() {
        let mut p = make_participant();
        p.record_trade(None); // open
        p.record_trade(Some(Decimal::from(50))); // winning close
        p.record_trade(Some(Decimal::from(-20))); // losing close
        p.record_trade(Some(Decimal::ZERO)); // breakeven close

        assert_eq!(p.total_trades, 4);
        assert_eq!(p.winning_trades, 1);
        assert_eq!(p.losing_trades, 1);
    }

    #[test]
    fn test_peak_equity_only_rises() {
        let mut p = make_participant();
        p.update_equity(Decimal::from(12_000));
        p.update_equity(Decimal::from(9_000));

        assert_eq!(p.current_equity, Decimal::from(9_000));
        assert_eq!(p.peak_equity, Decimal::from(12_000));
    }

    #[test]
    fn test_terminal_transitions() {
        let mut p = make_participant();
        p.liquidate().unwrap();
        assert_eq!(p.status, ParticipantStatus::Liquidated);

        // Terminal states reject further transitions
        assert!(p.disqualify().is_err());
        assert!(p.withdraw().is_err());
    }
}
