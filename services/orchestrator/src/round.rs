//! The per-participant decision round

use chrono::Utc;
use engine::trading::{self, ExecutionContext, ExecutionOptions};
use futures::future::join_all;
use market_data::PriceService;
use model_gateway::{invoke_with_retry, InvokeError, InvokeRequest, InvokeResponse, ModelRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{ExecutionCommit, Store, StoreError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use types::competition::Competition;
use types::decision::{AgentDecision, DecisionKind, DecisionRecord, OrderOutcome, RoundStatus};
use types::ids::{CompetitionId, DecisionId, ParticipantId, Symbol};
use types::participant::Participant;

use crate::lanes::{InFlight, LaneMap};
use crate::{parser, prompt, snapshot, OrchestratorConfig};

/// Why a tick produced no round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The previous round is still running; ticks are dropped, not queued
    Overlap,
    ParticipantInactive,
    CompetitionInactive,
}

/// One tick's result for one participant.
#[derive(Debug)]
pub enum RoundOutcome {
    Completed(Box<DecisionRecord>),
    Skipped(SkipReason),
}

#[derive(Error, Debug)]
pub enum RoundError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub struct Orchestrator {
    store: Arc<dyn Store>,
    prices: Arc<PriceService>,
    models: Arc<ModelRegistry>,
    pub(crate) lanes: LaneMap,
    in_flight: InFlight,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        prices: Arc<PriceService>,
        models: Arc<ModelRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            prices,
            models,
            lanes: LaneMap::new(),
            in_flight: InFlight::new(),
            config,
        }
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) fn prices(&self) -> &PriceService {
        &self.prices
    }

    /// Run one decision round for one participant.
    ///
    /// Serialization: the caller may fire this from any task; the
    /// in-flight guard drops overlapping ticks and the lane serializes
    /// state access. The lane is not held during the model invocation.
    pub async fn run_round(
        &self,
        participant_id: ParticipantId,
        cancel: &CancellationToken,
    ) -> Result<RoundOutcome, RoundError> {
        let Some(_in_flight) = self.in_flight.begin(participant_id) else {
            return Ok(RoundOutcome::Skipped(SkipReason::Overlap));
        };

        let participant = self.store.participant(participant_id)?;
        if !participant.is_active() {
            return Ok(RoundOutcome::Skipped(SkipReason::ParticipantInactive));
        }
        let competition = self.store.competition(participant.competition_id)?;
        let now = Utc::now();
        if !competition.accepts_orders_at(now) || !competition.market_open_at(now) {
            return Ok(RoundOutcome::Skipped(SkipReason::CompetitionInactive));
        }

        let symbols: Vec<Symbol> = competition.allowed_symbols.iter().cloned().collect();

        // Market-data suspension point, taken before the lane
        let prices = self.prices.latest(&symbols).await;

        // Lane held for snapshot + prompt build only
        let lane = self.lanes.lane(participant_id);
        let (round_snapshot, prompt_text) = {
            let _lane = lane.lock().await;
            let round_snapshot = snapshot::take(
                self.store.as_ref(),
                &competition,
                &participant,
                prices,
                &self.config,
            )?;
            let prompt_text = prompt::build(&round_snapshot, &self.config);
            (round_snapshot, prompt_text)
        };

        let decision_id = DecisionId::new();
        let started = Instant::now();
        let invoked = self.invoke(&participant, &prompt_text, cancel).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut record = DecisionRecord {
            id: decision_id,
            participant_id,
            competition_id: competition.id,
            prompt: prompt_text,
            raw_response: None,
            parsed: None,
            outcomes: Vec::new(),
            status: RoundStatus::Success,
            error: None,
            latency_ms,
            prompt_tokens: None,
            response_tokens: None,
            cost_estimate: None,
            market_snapshot: serde_json::to_value(&round_snapshot.prices).unwrap_or(Value::Null),
            portfolio_snapshot: serde_json::to_value(&round_snapshot.view).unwrap_or(Value::Null),
            created_at: Utc::now(),
        };

        match invoked {
            Err(invoke_error) => {
                record.status = match invoke_error {
                    InvokeError::Timeout { .. } => RoundStatus::Timeout,
                    _ => RoundStatus::TransportError,
                };
                record.error = Some(invoke_error.to_string());
                warn!(
                    participant_id = %participant_id,
                    provider = %participant.provider,
                    error = %invoke_error,
                    "model invocation failed; recording round without orders"
                );
            }
            Ok(response) => {
                record.raw_response = Some(response.text.clone());
                record.prompt_tokens = response.prompt_tokens;
                record.response_tokens = response.response_tokens;
                record.cost_estimate = response.cost_estimate;

                match parser::parse_decision(&response.text) {
                    Err(parse_error) => {
                        record.status = RoundStatus::InvalidResponse;
                        record.error = Some(parse_error.to_string());
                        warn!(
                            participant_id = %participant_id,
                            error = %parse_error,
                            "unparsable decision; zero orders submitted"
                        );
                    }
                    Ok(decision) => {
                        let (outcomes, execution_error) = self
                            .execute_decision(&competition, participant_id, decision_id, &decision, &symbols)
                            .await?;
                        record.parsed = Some(decision);
                        record.outcomes = outcomes;
                        record.error = execution_error;
                    }
                }
            }
        }

        // Record persistence is its own step, outside the lane
        self.store.insert_decision(record.clone())?;
        info!(
            participant_id = %participant_id,
            decision_id = %record.id,
            status = ?record.status,
            orders = record.outcomes.len(),
            latency_ms = record.latency_ms,
            "decision round recorded"
        );

        Ok(RoundOutcome::Completed(Box::new(record)))
    }

    /// Fan one decision tick out over every active participant of a
    /// competition. Per-participant serialization still holds; ordering
    /// across participants is not promised.
    pub async fn run_competition(
        &self,
        competition_id: CompetitionId,
        cancel: &CancellationToken,
    ) -> Result<Vec<(ParticipantId, Result<RoundOutcome, RoundError>)>, StoreError> {
        let participants = self.store.participants_in(competition_id);
        let rounds = participants
            .iter()
            .filter(|p| p.is_active())
            .map(|p| async move { (p.id, self.run_round(p.id, cancel).await) });
        Ok(join_all(rounds).await)
    }

    async fn invoke(
        &self,
        participant: &Participant,
        prompt_text: &str,
        cancel: &CancellationToken,
    ) -> Result<InvokeResponse, InvokeError> {
        let Some(client) = self.models.get(&participant.provider) else {
            return Err(InvokeError::Auth {
                message: format!("no adapter registered for provider {:?}", participant.provider),
            });
        };

        let request = InvokeRequest {
            model: participant.model.clone(),
            prompt: prompt_text.to_owned(),
            config: participant.model_config.clone(),
            timeout: Duration::from_secs(u64::from(participant.invocation_timeout_secs)),
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(InvokeError::Cancelled),
            result = invoke_with_retry(client.as_ref(), &request) => result,
        }
    }

    /// Execute orders in list order against *current* state (never the
    /// snapshot), inside the lane. Earlier orders consume margin and
    /// size budget before later ones validate.
    async fn execute_decision(
        &self,
        competition: &Competition,
        participant_id: ParticipantId,
        decision_id: DecisionId,
        decision: &AgentDecision,
        symbols: &[Symbol],
    ) -> Result<(Vec<OrderOutcome>, Option<String>), RoundError> {
        if decision.decision == DecisionKind::Hold {
            if !decision.orders.is_empty() {
                warn!(
                    participant_id = %participant_id,
                    orders = decision.orders.len(),
                    "hold decision carried orders; ignoring them"
                );
            }
            return Ok((Vec::new(), None));
        }

        let lane = self.lanes.lane(participant_id);
        let _lane = lane.lock().await;

        let mut participant = self.store.participant(participant_id)?;
        let mut portfolio = self.store.portfolio_of(participant_id)?;
        let mut positions = self.store.positions_of(portfolio.id);
        // Re-validation sees the latest published marks
        let current_prices = self.prices.cached(symbols);
        let now = Utc::now();

        let mut outcomes = Vec::new();
        for request in &decision.orders {
            let executed = {
                let mut ctx = ExecutionContext {
                    competition,
                    participant: &mut participant,
                    portfolio: &mut portfolio,
                    positions: &mut positions,
                    prices: &current_prices,
                    now,
                };
                trading::execute_order(&mut ctx, request, &ExecutionOptions::for_decision(decision_id))
            };

            match executed {
                Ok(execution) => {
                    outcomes.push(execution.outcome());
                    if execution.trade.is_some() {
                        self.store.commit_execution(ExecutionCommit {
                            participant: participant.clone(),
                            portfolio: portfolio.clone(),
                            positions: positions.clone(),
                            order: execution.order,
                            trade: execution.trade,
                        })?;
                    } else {
                        self.store.insert_order(execution.order)?;
                    }
                }
                Err(engine_error) => {
                    error!(
                        participant_id = %participant_id,
                        error = %engine_error,
                        "accounting invariant violated; disqualifying participant"
                    );
                    if participant.disqualify().is_ok() {
                        self.store.put_participant(participant.clone())?;
                    }
                    return Ok((outcomes, Some(engine_error.to_string())));
                }
            }
        }

        Ok((outcomes, None))
    }
}
