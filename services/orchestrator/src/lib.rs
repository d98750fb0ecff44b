//! Decision orchestrator
//!
//! Drives one participant round end to end:
//! snapshot → prompt → model invoke → parse → per-order execution →
//! audit record, with the per-participant lane held only around the
//! snapshot and the execution phases. Also hosts the risk-monitor
//! driver that runs after every price refresh.

pub mod lanes;
pub mod parser;
pub mod prompt;
pub mod risk;
pub mod round;
pub mod snapshot;

use rust_decimal::Decimal;

pub use risk::RiskSweep;
pub use round::{Orchestrator, RoundError, RoundOutcome, SkipReason};

/// Tunables for round building.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Trades shown in the snapshot, newest first
    pub recent_trades: usize,
    /// Leaderboard rows shown to the agent
    pub leaderboard_slice: usize,
    /// Advertised buffer below the notional cap, in percent
    pub safety_buffer_pct: Decimal,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            recent_trades: 10,
            leaderboard_slice: 10,
            safety_buffer_pct: Decimal::from(5),
        }
    }
}
