//! Auth-gated admin operations

use axum::{
    extract::{Path, State},
    Json,
};
use orchestrator::RoundOutcome;
use serde_json::{json, Value};
use tracing::{info, warn};
use types::ids::ParticipantId;

use crate::auth::RequireApiKey;
use crate::error::ApiError;
use crate::models::{InvokeAllResponse, ResetCompetitionRequest, StatusResponse};
use crate::state::AppState;

/// Fire a decision round for every active participant of every active
/// competition, off-schedule. Rounds run detached; overlap with the
/// scheduler's own ticks is resolved by the per-participant guard.
pub async fn invoke_participants(
    State(state): State<AppState>,
    _key: RequireApiKey,
) -> Result<Json<InvokeAllResponse>, ApiError> {
    let active: Vec<_> = state
        .store
        .competitions()
        .into_iter()
        .filter(|c| c.is_active())
        .collect();

    let mut participants = 0;
    for competition in &active {
        participants += state
            .store
            .participants_in(competition.id)
            .iter()
            .filter(|p| p.is_active())
            .count();
        let orchestrator = state.orchestrator.clone();
        let cancel = state.scheduler.cancel_token();
        let competition_id = competition.id;
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run_competition(competition_id, &cancel).await {
                warn!(competition_id = %competition_id, error = %e, "manual invocation failed");
            }
        });
    }

    info!(competitions = active.len(), participants, "manual invocation scheduled");
    Ok(Json(InvokeAllResponse {
        competitions: active.len(),
        participants,
    }))
}

/// Run one round for one participant and wait for its record.
pub async fn trigger_invocation(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Path(id): Path<ParticipantId>,
) -> Result<Json<Value>, ApiError> {
    let cancel = state.scheduler.cancel_token();
    match state.orchestrator.run_round(id, &cancel).await? {
        RoundOutcome::Completed(record) => Ok(Json(json!({
            "outcome": "completed",
            "record": *record,
        }))),
        RoundOutcome::Skipped(reason) => Ok(Json(json!({
            "outcome": "skipped",
            "reason": format!("{reason:?}"),
        }))),
    }
}

/// Restore a competition to initial capital, wiping all trading history.
pub async fn reset_competition(
    State(state): State<AppState>,
    _key: RequireApiKey,
    Json(request): Json<ResetCompetitionRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.store.reset_competition(request.competition_id)?;
    info!(competition_id = %request.competition_id, "competition reset");
    Ok(Json(StatusResponse::ok()))
}
