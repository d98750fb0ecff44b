//! Persistence interface
//!
//! The engine and orchestrator talk to storage through the [`Store`]
//! trait only; the in-memory implementation in [`memory`] is the
//! reference backend. A relational backend slots in behind the same
//! trait with per-entity transactions.
//!
//! Atomicity contract: `commit_execution` writes participant, portfolio,
//! positions, order and trade as one unit. Callers hold the
//! participant's lane across the call, which is what makes the
//! in-memory sequential writes transactional in practice.

pub mod memory;

use thiserror::Error;
use types::audit::LiquidationEvent;
use types::competition::Competition;
use types::decision::DecisionRecord;
use types::ids::{CompetitionId, ParticipantId, PortfolioId};
use types::order::Order;
use types::participant::Participant;
use types::portfolio::Portfolio;
use types::position::Position;
use types::trade::Trade;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Everything one executed (or rejected) order changes, committed as a
/// unit.
#[derive(Debug, Clone)]
pub struct ExecutionCommit {
    pub participant: Participant,
    pub portfolio: Portfolio,
    /// Full open-position set after the execution
    pub positions: Vec<Position>,
    pub order: Order,
    pub trade: Option<Trade>,
}

pub trait Store: Send + Sync {
    // -- competitions ------------------------------------------------------

    fn insert_competition(&self, competition: Competition) -> Result<(), StoreError>;
    fn competition(&self, id: CompetitionId) -> Result<Competition, StoreError>;
    fn competitions(&self) -> Vec<Competition>;
    fn put_competition(&self, competition: Competition) -> Result<(), StoreError>;

    // -- participants ------------------------------------------------------

    /// Create a participant together with its (exclusively owned)
    /// portfolio.
    fn enroll(&self, participant: Participant, portfolio: Portfolio) -> Result<(), StoreError>;
    fn participant(&self, id: ParticipantId) -> Result<Participant, StoreError>;
    fn participants_in(&self, competition_id: CompetitionId) -> Vec<Participant>;
    fn put_participant(&self, participant: Participant) -> Result<(), StoreError>;

    // -- portfolio state ---------------------------------------------------

    fn portfolio_of(&self, participant_id: ParticipantId) -> Result<Portfolio, StoreError>;
    fn put_portfolio(&self, portfolio: Portfolio) -> Result<(), StoreError>;
    fn positions_of(&self, portfolio_id: PortfolioId) -> Vec<Position>;
    fn replace_positions(
        &self,
        portfolio_id: PortfolioId,
        positions: Vec<Position>,
    ) -> Result<(), StoreError>;

    // -- history -----------------------------------------------------------

    /// Persist a rejected order (executed orders travel inside the
    /// commit).
    fn insert_order(&self, order: Order) -> Result<(), StoreError>;
    /// Newest first.
    fn orders_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<Order>;
    /// Newest first.
    fn trades_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<Trade>;
    fn insert_decision(&self, record: DecisionRecord) -> Result<(), StoreError>;
    /// Newest first.
    fn decisions_of(&self, participant_id: ParticipantId, limit: usize) -> Vec<DecisionRecord>;
    fn insert_liquidation(&self, event: LiquidationEvent) -> Result<(), StoreError>;
    fn liquidations_of(&self, participant_id: ParticipantId) -> Vec<LiquidationEvent>;

    // -- execution ---------------------------------------------------------

    /// Atomically persist everything one execution changed.
    fn commit_execution(&self, commit: ExecutionCommit) -> Result<(), StoreError>;

    // -- admin -------------------------------------------------------------

    /// Restore every participant of a competition to initial capital and
    /// wipe positions, orders, trades and decision records.
    fn reset_competition(&self, competition_id: CompetitionId) -> Result<(), StoreError>;
}
