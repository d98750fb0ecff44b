//! DashMap-backed reference store

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::info;
use types::audit::LiquidationEvent;
use types::competition::Competition;
use types::decision::DecisionRecord;
use types::ids::{CompetitionId, ParticipantId, PortfolioId};
use types::order::Order;
use types::participant::{Participant, ParticipantStatus};
use types::portfolio::Portfolio;
use types::position::Position;
use types::trade::Trade;

use crate::{ExecutionCommit, Store, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    competitions: DashMap<CompetitionId, Competition>,
    participants: DashMap<ParticipantId, Participant>,
    portfolios: DashMap<PortfolioId, Portfolio>,
    portfolio_ids: DashMap<ParticipantId, PortfolioId>,
    positions: DashMap<PortfolioId, Vec<Position>>,
    orders: DashMap<ParticipantId, Vec<Order>>,
    trades: DashMap<ParticipantId, Vec<Trade>>,
    decisions: DashMap<ParticipantId, Vec<DecisionRecord>>,
    liquidations: DashMap<ParticipantId, Vec<LiquidationEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: Option<&Vec<T>>, limit: usize) -> Vec<T> {
    match items {
        Some(items) => items.iter().rev().take(limit).cloned().collect(),
        None => Vec::new(),
    }
}

impl Store for MemoryStore {
    fn insert_competition(&self, competition: Competition) -> Result<(), StoreError> {
        if self.competitions.contains_key(&competition.id) {
            return Err(StoreError::Duplicate {
                entity: "competition",
                id: competition.id.to_string(),
            });
        }
        self.competitions.insert(competition.id, competition);
        Ok(())
    }

    fn competition(&self, id: CompetitionId) -> Result<Competition, StoreError> {
        self.competitions
            .get(&id)
            .map(|c| c.clone())
            .ok_or_else(|| StoreError::not_found("competition", id))
    }

    fn competitions(&self) -> Vec<Competition> {
        let mut all: Vec<Competition> = self.competitions.iter().map(|c| c.clone()).collect();
        all.sort_by_key(|c| c.id);
        all
    }

    fn put_competition(&self, competition: Competition) -> Result<(), StoreError> {
        if !self.competitions.contains_key(&competition.id) {
            return Err(StoreError::not_found("competition", competition.id));
        }
        self.competitions.insert(competition.id, competition);
        Ok(())
    }

    fn enroll(&self, participant: Participant, portfolio: Portfolio) -> Result<(), StoreError> {
        let competition = self.competition(participant.competition_id)?;
        if matches!(
            competition.status,
            types::competition::CompetitionStatus::Completed
                | types::competition::CompetitionStatus::Cancelled
        ) {
            return Err(StoreError::Conflict {
                message: format!("competition {} is closed to enrollment", competition.id),
            });
        }
        let enrolled = self.participants_in(competition.id).len();
        if enrolled >= competition.max_participants as usize {
            return Err(StoreError::Conflict {
                message: format!(
                    "competition {} is full ({} participants)",
                    competition.id, enrolled
                ),
            });
        }
        if portfolio.participant_id != participant.id {
            return Err(StoreError::Conflict {
                message: "portfolio does not belong to the enrolling participant".into(),
            });
        }

        self.portfolio_ids.insert(participant.id, portfolio.id);
        self.positions.insert(portfolio.id, Vec::new());
        self.portfolios.insert(portfolio.id, portfolio);
        self.participants.insert(participant.id, participant);
        Ok(())
    }

    fn participant(&self, id: ParticipantId) -> Result<Participant, StoreError> {
        self.participants
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| StoreError::not_found("participant", id))
    }

    fn participants_in(&self, competition_id: CompetitionId) -> Vec<Participant> {
        let mut all: Vec<Participant> = self
            .participants
            .iter()
            .filter(|p| p.competition_id == competition_id)
            .map(|p| p.clone())
            .collect();
        all.sort_by_key(|p| p.id);
        all
    }

    fn put_participant(&self, participant: Participant) -> Result<(), StoreError> {
        if !self.participants.contains_key(&participant.id) {
            return Err(StoreError::not_found("participant", participant.id));
        }
        self.participants.insert(participant.id, participant);
        Ok(())
    }

    fn portfolio_of(&self, participant_id: ParticipantId) -> Result<Portfolio, StoreError> {
        let portfolio_id = self
            .portfolio_ids
            .get(&participant_id)
            .map(|id| *id)
            .ok_or_else(|| StoreError::not_found("portfolio", participant_id))?;
        self.portfolios
            .get(&portfolio_id)
            .map(|p| p.clone())
            .ok_or_else(|| StoreError::not_found("portfolio", portfolio_id))
    }

    fn put_portfolio(&self, portfolio: Portfolio) -> Result<(), StoreError> {
        if !self.portfolios.contains_key(&portfolio.id) {
            return Err(StoreError::not_found("portfolio", portfolio.id));
        }
        self.portfolios.insert(portfolio.id, portfolio);
        Ok(())
    }

    fn positions_of(&self, portfolio_id: PortfolioId) -> Vec<Position> {
        self.positions
            .get(&portfolio_id)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn replace_positions(
        &self,
        portfolio_id: PortfolioId,
        positions: Vec<Position>,
    ) -> Result<(), StoreError> {
        if !self.portfolios.contains_key(&portfolio_id) {
            return Err(StoreError::not_found("portfolio", portfolio_id));
        }
        self.positions.insert(portfolio_id, positions);
        Ok(())
    }

    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        self.orders
            .entry(order.participant_id)
            .or_default()
            .push(order);
        Ok(())
    }

    fn orders_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<Order> {
        newest_first(self.orders.get(&participant_id).as_deref(), limit)
    }

    fn trades_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<Trade> {
        newest_first(self.trades.get(&participant_id).as_deref(), limit)
    }

    fn insert_decision(&self, record: DecisionRecord) -> Result<(), StoreError> {
        self.decisions
            .entry(record.participant_id)
            .or_default()
            .push(record);
        Ok(())
    }

    fn decisions_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<DecisionRecord> {
        newest_first(self.decisions.get(&participant_id).as_deref(), limit)
    }

    fn insert_liquidation(&self, event: LiquidationEvent) -> Result<(), StoreError> {
        self.liquidations
            .entry(event.participant_id)
            .or_default()
            .push(event);
        Ok(())
    }

    fn liquidations_of(&self, participant_id: ParticipantId) -> Vec<LiquidationEvent> {
        self.liquidations
            .get(&participant_id)
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    fn commit_execution(&self, commit: ExecutionCommit) -> Result<(), StoreError> {
        let participant_id = commit.participant.id;
        if !self.participants.contains_key(&participant_id) {
            return Err(StoreError::not_found("participant", participant_id));
        }

        self.participants
            .insert(participant_id, commit.participant);
        self.positions
            .insert(commit.portfolio.id, commit.positions);
        self.portfolios.insert(commit.portfolio.id, commit.portfolio);
        self.orders
            .entry(participant_id)
            .or_default()
            .push(commit.order);
        if let Some(trade) = commit.trade {
            self.trades.entry(participant_id).or_default().push(trade);
        }
        Ok(())
    }

    fn reset_competition(&self, competition_id: CompetitionId) -> Result<(), StoreError> {
        let competition = self.competition(competition_id)?;
        let initial: Decimal = competition.initial_capital;
        let now = chrono::Utc::now();

        for participant in self.participants_in(competition_id) {
            let portfolio_id = self
                .portfolio_ids
                .get(&participant.id)
                .map(|id| *id)
                .ok_or_else(|| StoreError::not_found("portfolio", participant.id))?;

            let mut reset = participant.clone();
            reset.status = ParticipantStatus::Active;
            reset.current_equity = initial;
            reset.peak_equity = initial;
            reset.total_trades = 0;
            reset.winning_trades = 0;
            reset.losing_trades = 0;
            self.participants.insert(reset.id, reset);

            self.portfolios
                .insert(portfolio_id, Portfolio {
                    id: portfolio_id,
                    participant_id: participant.id,
                    cash: initial,
                    reserved_margin: Decimal::ZERO,
                    realized_pnl: Decimal::ZERO,
                    updated_at: now,
                });
            self.positions.insert(portfolio_id, Vec::new());
            self.orders.remove(&participant.id);
            self.trades.remove(&participant.id);
            self.decisions.remove(&participant.id);
            self.liquidations.remove(&participant.id);
        }

        info!(competition_id = %competition_id, "competition reset to initial capital");
        Ok(())
    }
}
