//! Participant read surface

use axum::{
    extract::{Path, Query, State},
    Json,
};
use engine::stats::PerformanceReport;
use types::decision::DecisionRecord;
use types::ids::ParticipantId;
use types::order::Order;
use types::participant::Participant;
use types::portfolio::PortfolioView;
use types::position::Position;
use types::trade::Trade;

use crate::error::ApiError;
use crate::models::HistoryQuery;
use crate::state::AppState;

pub async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Result<Json<Participant>, ApiError> {
    Ok(Json(state.store.participant(id)?))
}

pub async fn portfolio(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Result<Json<PortfolioView>, ApiError> {
    state.store.participant(id)?;
    let portfolio = state.store.portfolio_of(id)?;
    let positions = state.store.positions_of(portfolio.id);
    Ok(Json(engine::portfolio::view(&portfolio, &positions)))
}

pub async fn positions(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Result<Json<Vec<Position>>, ApiError> {
    let portfolio = state.store.portfolio_of(id)?;
    Ok(Json(state.store.positions_of(portfolio.id)))
}

pub async fn trades(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    state.store.participant(id)?;
    Ok(Json(state.store.trades_of(id, query.limit_or(50))))
}

pub async fn orders(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    state.store.participant(id)?;
    Ok(Json(state.store.orders_of(id, query.limit_or(50))))
}

pub async fn invocations(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DecisionRecord>>, ApiError> {
    state.store.participant(id)?;
    Ok(Json(state.store.decisions_of(id, query.limit_or(20))))
}

pub async fn performance(
    State(state): State<AppState>,
    Path(id): Path<ParticipantId>,
) -> Result<Json<PerformanceReport>, ApiError> {
    let participant = state.store.participant(id)?;
    let competition = state.store.competition(participant.competition_id)?;
    let portfolio = state.store.portfolio_of(id)?;
    let positions = state.store.positions_of(portfolio.id);
    let view = engine::portfolio::view(&portfolio, &positions);
    Ok(Json(engine::stats::performance(
        &participant,
        &view,
        competition.initial_capital,
    )))
}
