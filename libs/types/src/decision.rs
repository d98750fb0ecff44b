//! Agent decision wire format and the per-round audit record

use crate::ids::{CompetitionId, DecisionId, OrderId, ParticipantId, PositionId, Symbol};
use crate::order::{OrderAction, OrderStatus, RejectReason};
use crate::position::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-level intent of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Trade,
    Hold,
}

/// One order as emitted by the agent.
///
/// For `open`, `side`, `quantity` and `leverage` are required (enforced
/// by the parser, not serde, so the whole reply can be reported back on
/// a schema failure). For `close`, `position_id` is preferred and
/// side/quantity are derived from the referenced position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub action: OrderAction,
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<PositionId>,
}

/// The structured directive parsed from a model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDecision {
    pub decision: DecisionKind,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub orders: Vec<OrderRequest>,
}

/// Terminal status of one agent round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Invocation, parse and execution all ran (orders may still have
    /// been rejected individually)
    Success,
    /// The model did not answer within the participant's deadline
    Timeout,
    /// The transport failed terminally (auth, network after retry,
    /// cancellation)
    TransportError,
    /// The reply carried no parsable decision
    InvalidResponse,
}

/// Per-order outcome recorded on the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<Decimal>,
}

/// Audit record of one complete agent round: the exact prompt, the raw
/// reply, the parsed decision and what every order did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub participant_id: ParticipantId,
    pub competition_id: CompetitionId,
    pub prompt: String,
    pub raw_response: Option<String>,
    pub parsed: Option<AgentDecision>,
    pub outcomes: Vec<OrderOutcome>,
    pub status: RoundStatus,
    pub error: Option<String>,
    pub latency_ms: u64,
    pub prompt_tokens: Option<u32>,
    pub response_tokens: Option<u32>,
    pub cost_estimate: Option<Decimal>,
    /// Price map the agent saw, as serialized for the prompt
    pub market_snapshot: serde_json::Value,
    /// Portfolio view the agent saw
    pub portfolio_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
