//! REST surface for the agent trading arena
//!
//! Layout follows the service split: handlers per resource, a central
//! error envelope, a shared-secret auth extractor, and state wiring the
//! store, price service, orchestrator and scheduler together.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

use market_data::binance::BinanceSource;
use market_data::fixture::StaticSource;
use market_data::{MarketDataSource, PriceCache, PriceService};
use model_gateway::anthropic::AnthropicClient;
use model_gateway::mock::MockClient;
use model_gateway::openai::OpenAiCompatClient;
use model_gateway::ModelRegistry;
use orchestrator::{Orchestrator, OrchestratorConfig};
use scheduler::{Scheduler, SchedulerConfig};
use std::sync::Arc;
use store::{MemoryStore, Store};
use tracing::info;

use crate::config::{Config, MarketSourceKind};
use crate::state::AppState;

/// Wire the whole service graph from configuration.
pub fn build_state(config: &Config) -> AppState {
    let http = reqwest::Client::new();

    let source: Arc<dyn MarketDataSource> = match config.market_source {
        MarketSourceKind::Binance => Arc::new(BinanceSource::new(
            http.clone(),
            config.binance_base_url.clone(),
        )),
        MarketSourceKind::Static => Arc::new(StaticSource::new()),
    };
    let prices = Arc::new(PriceService::new(PriceCache::with_default_ttl(), source));

    let mut registry = ModelRegistry::new().register("mock", Arc::new(MockClient::always_hold()));
    if let Some(key) = &config.anthropic_api_key {
        registry = registry.register(
            "anthropic",
            Arc::new(AnthropicClient::with_defaults(key.clone())),
        );
    }
    if let Some(key) = &config.openai_api_key {
        registry = registry.register("openai", Arc::new(OpenAiCompatClient::openai(key.clone())));
    }
    if let Some(key) = &config.deepseek_api_key {
        registry = registry.register(
            "deepseek",
            Arc::new(OpenAiCompatClient::new(
                http.clone(),
                "https://api.deepseek.com/v1",
                key.clone(),
                "deepseek",
            )),
        );
    }
    let registry = Arc::new(registry);
    info!(providers = ?registry.tags(), "model registry ready");

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        prices.clone(),
        registry,
        OrchestratorConfig::default(),
    ));
    let scheduler = Scheduler::new(
        store.clone(),
        prices.clone(),
        orchestrator.clone(),
        SchedulerConfig {
            price_refresh: config.price_refresh,
            ..SchedulerConfig::default()
        },
    );

    AppState {
        store,
        prices,
        orchestrator,
        scheduler,
        api_key: Arc::from(config.api_key.as_str()),
    }
}
