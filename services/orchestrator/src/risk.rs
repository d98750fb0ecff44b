//! Risk-monitor driver
//!
//! Runs inside the price-refresh cycle for every active participant:
//! reprice the portfolio against the published marks, then flatten it if
//! the maintenance threshold was crossed. Forced closes reuse the
//! trading engine with activity checks bypassed, so liquidation
//! accounting is byte-for-byte the ordinary close path.

use chrono::Utc;
use engine::trading::{self, ExecutionContext, ExecutionOptions};
use engine::{portfolio as portfolio_mgr, risk};
use store::ExecutionCommit;
use tracing::{error, info, warn};
use types::audit::LiquidationEvent;
use types::ids::{ParticipantId, Symbol};

use crate::round::{Orchestrator, RoundError};

/// Outcome of one sweep over one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSweep {
    /// Participant not active; nothing to do
    Skipped,
    /// Repriced, above maintenance
    Healthy,
    /// Threshold crossed but some positions could not close this tick
    /// (price unavailable); retried on the next refresh
    Pending { remaining: usize },
    /// All positions flattened, participant marked liquidated
    Liquidated { closed: usize },
}

impl Orchestrator {
    /// Reprice one participant's positions against the published marks
    /// and force-flatten the portfolio if liquidation triggered.
    pub async fn reprice_and_check(
        &self,
        participant_id: ParticipantId,
    ) -> Result<RiskSweep, RoundError> {
        let mut participant = self.store().participant(participant_id)?;
        if !participant.is_active() {
            return Ok(RiskSweep::Skipped);
        }
        let competition = self.store().competition(participant.competition_id)?;
        let symbols: Vec<Symbol> = competition.allowed_symbols.iter().cloned().collect();

        let lane = self.lanes.lane(participant_id);
        let _lane = lane.lock().await;

        let mut portfolio = self.store().portfolio_of(participant_id)?;
        let mut positions = self.store().positions_of(portfolio.id);
        let prices = self.prices().cached(&symbols);

        portfolio_mgr::reprice_all(&mut positions, &prices);
        let view = portfolio_mgr::view(&portfolio, &positions);
        participant.update_equity(view.equity);
        self.store().replace_positions(portfolio.id, positions.clone())?;
        self.store().put_participant(participant.clone())?;

        if !risk::liquidation_required(&view, competition.maintenance_margin_pct) {
            return Ok(RiskSweep::Healthy);
        }

        warn!(
            participant_id = %participant_id,
            equity = %view.equity,
            reserved_margin = %view.reserved_margin,
            margin_level_pct = ?view.margin_level_pct,
            "liquidation triggered; flattening portfolio"
        );

        let trigger_view = view;
        let requests = risk::forced_close_requests(&positions);
        let mut closed = Vec::new();
        let now = Utc::now();

        for request in &requests {
            let executed = {
                let mut ctx = ExecutionContext {
                    competition: &competition,
                    participant: &mut participant,
                    portfolio: &mut portfolio,
                    positions: &mut positions,
                    prices: &prices,
                    now,
                };
                trading::execute_order(&mut ctx, request, &ExecutionOptions::forced_liquidation())
            };

            match executed {
                Ok(execution) if execution.trade.is_some() => {
                    if let Some(position_id) = request.position_id {
                        closed.push(position_id);
                    }
                    self.store().commit_execution(ExecutionCommit {
                        participant: participant.clone(),
                        portfolio: portfolio.clone(),
                        positions: positions.clone(),
                        order: execution.order,
                        trade: execution.trade,
                    })?;
                }
                Ok(execution) => {
                    warn!(
                        participant_id = %participant_id,
                        reason = ?execution.order.reject_reason,
                        "forced close rejected; will retry next refresh"
                    );
                    self.store().insert_order(execution.order)?;
                }
                Err(engine_error) => {
                    error!(
                        participant_id = %participant_id,
                        error = %engine_error,
                        "accounting invariant violated during liquidation; disqualifying"
                    );
                    if participant.disqualify().is_ok() {
                        self.store().put_participant(participant.clone())?;
                    }
                    return Ok(RiskSweep::Pending {
                        remaining: positions.len(),
                    });
                }
            }
        }

        if !positions.is_empty() {
            return Ok(RiskSweep::Pending {
                remaining: positions.len(),
            });
        }

        // Terminal transition once the book is flat
        if participant.liquidate().is_ok() {
            self.store().put_participant(participant.clone())?;
        }
        self.store().insert_liquidation(LiquidationEvent::new(
            participant_id,
            competition.id,
            trigger_view.equity,
            trigger_view.reserved_margin,
            trigger_view.margin_level_pct,
            closed.clone(),
            now,
        ))?;
        info!(
            participant_id = %participant_id,
            closed = closed.len(),
            final_equity = %participant.current_equity,
            "participant liquidated"
        );

        Ok(RiskSweep::Liquidated {
            closed: closed.len(),
        })
    }
}
