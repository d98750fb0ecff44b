//! Shared application state

use market_data::PriceService;
use orchestrator::Orchestrator;
use scheduler::Scheduler;
use std::sync::Arc;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub prices: Arc<PriceService>,
    pub orchestrator: Arc<Orchestrator>,
    pub scheduler: Arc<Scheduler>,
    /// Shared secret gating mutating and admin endpoints
    pub api_key: Arc<str>,
}
