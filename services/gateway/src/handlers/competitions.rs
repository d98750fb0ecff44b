//! Competition CRUD, lifecycle and leaderboard handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use types::competition::{Competition, CompetitionParams};
use types::ids::CompetitionId;
use types::participant::{Participant, ParticipantParams};
use types::portfolio::Portfolio;

use crate::auth::RequireApiKey;
use crate::error::ApiError;
use crate::models::LeaderboardResponse;
use crate::state::AppState;

pub async fn create_competition(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Json(params): Json<CompetitionParams>,
) -> Result<(StatusCode, Json<Competition>), ApiError> {
    let competition = Competition::new(params, Utc::now())?;
    state.store.insert_competition(competition.clone())?;
    info!(competition_id = %competition.id, name = %competition.name, "competition created");
    Ok((StatusCode::CREATED, Json(competition)))
}

pub async fn list_competitions(
    State(state): State<AppState>,
) -> Json<Vec<Competition>> {
    Json(state.store.competitions())
}

pub async fn get_competition(
    State(state): State<AppState>,
    Path(id): Path<CompetitionId>,
) -> Result<Json<Competition>, ApiError> {
    Ok(Json(state.store.competition(id)?))
}

pub async fn start_competition(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Path(id): Path<CompetitionId>,
) -> Result<Json<Competition>, ApiError> {
    let mut competition = state.store.competition(id)?;
    competition.start()?;
    state.store.put_competition(competition.clone())?;
    info!(competition_id = %id, "competition started manually");
    Ok(Json(competition))
}

pub async fn stop_competition(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Path(id): Path<CompetitionId>,
) -> Result<Json<Competition>, ApiError> {
    let mut competition = state.store.competition(id)?;
    competition.complete()?;
    state.store.put_competition(competition.clone())?;
    info!(competition_id = %id, "competition stopped manually");
    Ok(Json(competition))
}

pub async fn create_participant(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Path(competition_id): Path<CompetitionId>,
    Json(params): Json<ParticipantParams>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let competition = state.store.competition(competition_id)?;
    let participant = Participant::new(
        competition_id,
        params,
        competition.initial_capital,
        Utc::now(),
    );
    let portfolio = Portfolio::new(participant.id, competition.initial_capital, Utc::now());
    state.store.enroll(participant.clone(), portfolio)?;
    info!(
        competition_id = %competition_id,
        participant_id = %participant.id,
        name = %participant.name,
        provider = %participant.provider,
        "participant enrolled"
    );
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Path(id): Path<CompetitionId>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let competition = state.store.competition(id)?;
    let participants = state.store.participants_in(id);
    let rows = engine::stats::leaderboard(&participants, competition.initial_capital);
    Ok(Json(LeaderboardResponse {
        competition_id: id,
        rows,
    }))
}

/// Participants of a competition (not in the numbered surface, but the
/// dashboard needs the roster).
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<CompetitionId>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    state.store.competition(id)?;
    Ok(Json(state.store.participants_in(id)))
}
