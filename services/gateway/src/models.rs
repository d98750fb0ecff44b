//! Request/response shapes specific to the REST surface
//!
//! Entities serialize directly; these are the shapes that do not map
//! 1:1 onto a stored entity.

use engine::stats::LeaderboardRow;
use serde::{Deserialize, Serialize};
use types::ids::CompetitionId;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, 500)
    }
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub competition_id: CompetitionId,
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Debug, Deserialize)]
pub struct ResetCompetitionRequest {
    pub competition_id: CompetitionId,
}

#[derive(Debug, Serialize)]
pub struct InvokeAllResponse {
    /// Competitions whose participants were scheduled this call
    pub competitions: usize,
    /// Total participants scheduled
    pub participants: usize,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
