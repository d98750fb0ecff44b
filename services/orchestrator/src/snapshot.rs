//! Round snapshot: the only view of the world the agent sees

use chrono::{DateTime, Utc};
use engine::stats::{self, LeaderboardRow};
use serde::Serialize;
use store::{Store, StoreError};
use types::competition::Competition;
use types::market::PriceMap;
use types::participant::Participant;
use types::portfolio::PortfolioView;
use types::position::Position;
use types::trade::Trade;

use crate::OrchestratorConfig;

/// Consistent view of portfolio, market and standings at one instant.
///
/// Taken inside the participant's lane; by the time orders execute the
/// world may have moved, which is why execution re-validates against
/// current state instead of this snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot {
    pub competition: Competition,
    pub participant: Participant,
    pub view: PortfolioView,
    pub positions: Vec<Position>,
    pub recent_trades: Vec<Trade>,
    pub leaderboard: Vec<LeaderboardRow>,
    pub prices: PriceMap,
    pub taken_at: DateTime<Utc>,
}

pub fn take(
    store: &dyn Store,
    competition: &Competition,
    participant: &Participant,
    prices: PriceMap,
    config: &OrchestratorConfig,
) -> Result<RoundSnapshot, StoreError> {
    let portfolio = store.portfolio_of(participant.id)?;
    let mut positions = store.positions_of(portfolio.id);
    // Mark the positions against the same quotes the prompt will quote,
    // so equity and the market block agree within one snapshot
    engine::portfolio::reprice_all(&mut positions, &prices);
    let view = engine::portfolio::view(&portfolio, &positions);
    let recent_trades = store.trades_of(participant.id, config.recent_trades);

    let field = store.participants_in(competition.id);
    let mut leaderboard = stats::leaderboard(&field, competition.initial_capital);
    leaderboard.truncate(config.leaderboard_slice);

    Ok(RoundSnapshot {
        competition: competition.clone(),
        participant: participant.clone(),
        view,
        positions,
        recent_trades,
        leaderboard,
        prices,
        taken_at: Utc::now(),
    })
}
