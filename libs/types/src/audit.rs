//! Risk-monitor audit events

use crate::ids::{CompetitionId, ParticipantId, PositionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one forced liquidation: what tripped the threshold and
/// which positions were flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub id: Uuid,
    pub participant_id: ParticipantId,
    pub competition_id: CompetitionId,
    pub equity: Decimal,
    pub reserved_margin: Decimal,
    /// Margin level (%) at trigger time; `None` when equity was
    /// exhausted with no margin in use
    pub margin_level_pct: Option<Decimal>,
    pub closed_positions: Vec<PositionId>,
    pub triggered_at: DateTime<Utc>,
}

impl LiquidationEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        participant_id: ParticipantId,
        competition_id: CompetitionId,
        equity: Decimal,
        reserved_margin: Decimal,
        margin_level_pct: Option<Decimal>,
        closed_positions: Vec<PositionId>,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            participant_id,
            competition_id,
            equity,
            reserved_margin,
            margin_level_pct,
            closed_positions,
            triggered_at,
        }
    }
}
