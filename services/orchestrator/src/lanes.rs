//! Per-participant serialization
//!
//! Two pieces enforce the concurrency contract:
//!
//! - [`LaneMap`]: one async mutex per participant. Every write to that
//!   participant's portfolio, positions, orders, trades and records
//!   happens inside its lane. The lane is *not* held across the model
//!   invocation.
//! - [`InFlight`]: at most one outstanding decision round per
//!   participant. A tick that finds the flag set is dropped, never
//!   queued. This is separate from the lane because the lane is
//!   deliberately released mid-round.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use types::ids::ParticipantId;

/// Keyed mutex map; lanes are created on first use and never removed
/// (participants are few and long-lived).
#[derive(Default)]
pub struct LaneMap {
    lanes: DashMap<ParticipantId, Arc<Mutex<()>>>,
}

impl LaneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(&self, participant_id: ParticipantId) -> Arc<Mutex<()>> {
        self.lanes
            .entry(participant_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Round-overlap guard. `begin` returns `None` while a round is running.
#[derive(Default)]
pub struct InFlight {
    running: Arc<DashMap<ParticipantId, ()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, participant_id: ParticipantId) -> Option<InFlightGuard> {
        match self.running.entry(participant_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => None,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(InFlightGuard {
                    running: self.running.clone(),
                    participant_id,
                })
            }
        }
    }

    pub fn is_running(&self, participant_id: ParticipantId) -> bool {
        self.running.contains_key(&participant_id)
    }
}

/// Clears the in-flight flag when the round ends, however it ends.
pub struct InFlightGuard {
    running: Arc<DashMap<ParticipantId, ()>>,
    participant_id: ParticipantId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.running.remove(&self.participant_id);
    }
}
