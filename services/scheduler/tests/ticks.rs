//! Scheduler behavior: lifecycle, decision ticks, shutdown

use chrono::{Duration as ChronoDuration, Utc};
use market_data::fixture::StaticSource;
use market_data::{PriceCache, PriceService};
use model_gateway::mock::{MockClient, Scripted};
use model_gateway::ModelRegistry;
use orchestrator::{Orchestrator, OrchestratorConfig};
use rust_decimal::Decimal;
use scheduler::{Scheduler, SchedulerConfig};
use std::sync::Arc;
use std::time::Duration;
use store::{MemoryStore, Store};
use types::competition::{Competition, CompetitionParams, CompetitionStatus};
use types::decision::RoundStatus;
use types::ids::{ParticipantId, Symbol};
use types::participant::{Participant, ParticipantParams, ParticipantStatus};
use types::portfolio::Portfolio;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

struct Harness {
    store: Arc<MemoryStore>,
    source: Arc<StaticSource>,
    client: Arc<MockClient>,
    scheduler: Arc<Scheduler>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(StaticSource::new());
        source.set(Symbol::new("BTCUSDT"), dec("50000"));
        let prices = Arc::new(PriceService::new(
            PriceCache::with_default_ttl(),
            source.clone(),
        ));
        let client = Arc::new(MockClient::new([]));
        let models = Arc::new(ModelRegistry::new().register("mock", client.clone()));
        let orchestrator = Arc::new(Orchestrator::new(
            store.clone() as Arc<dyn Store>,
            prices.clone(),
            models,
            OrchestratorConfig::default(),
        ));
        let scheduler = Scheduler::new(
            store.clone() as Arc<dyn Store>,
            prices,
            orchestrator,
            SchedulerConfig {
                price_refresh: Duration::from_millis(50),
                supervision: Duration::from_millis(20),
            },
        );

        Self {
            store,
            source,
            client,
            scheduler,
        }
    }

    fn insert_competition(&self, starts_in_mins: i64, ends_in_mins: i64, started: bool) -> Competition {
        let mut competition = Competition::new(
            CompetitionParams {
                name: "tick-test".into(),
                starts_at: Utc::now() + ChronoDuration::minutes(starts_in_mins),
                ends_at: Utc::now() + ChronoDuration::minutes(ends_in_mins),
                initial_capital: dec("10000"),
                max_leverage: dec("10"),
                max_position_size_pct: dec("50"),
                margin_requirement_pct: dec("10"),
                maintenance_margin_pct: dec("20"),
                invocation_interval_minutes: 60,
                allowed_symbols: [Symbol::new("BTCUSDT")].into_iter().collect(),
                max_participants: 8,
                market_hours_only: false,
            },
            Utc::now(),
        )
        .unwrap();
        if started {
            competition.start().unwrap();
        }
        self.store.insert_competition(competition.clone()).unwrap();
        competition
    }

    fn enroll(&self, competition: &Competition) -> ParticipantId {
        let participant = Participant::new(
            competition.id,
            ParticipantParams {
                name: "mock-agent".into(),
                provider: "mock".into(),
                model: "scripted".into(),
                model_config: serde_json::Value::Null,
                invocation_timeout_secs: 30,
            },
            competition.initial_capital,
            Utc::now(),
        );
        let id = participant.id;
        let portfolio = Portfolio::new(id, competition.initial_capital, Utc::now());
        self.store.enroll(participant, portfolio).unwrap();
        id
    }
}

#[tokio::test]
async fn lifecycle_transitions_follow_the_window() {
    let harness = Harness::new();
    // Window entirely in the past: starts, then completes
    let competition = harness.insert_competition(-120, -60, false);

    harness.scheduler.supervise_once().await;
    assert_eq!(
        harness.store.competition(competition.id).unwrap().status,
        CompetitionStatus::Active
    );

    harness.scheduler.supervise_once().await;
    assert_eq!(
        harness.store.competition(competition.id).unwrap().status,
        CompetitionStatus::Completed
    );
}

#[tokio::test]
async fn pending_competition_before_start_stays_pending() {
    let harness = Harness::new();
    let competition = harness.insert_competition(60, 120, false);

    harness.scheduler.supervise_once().await;
    assert_eq!(
        harness.store.competition(competition.id).unwrap().status,
        CompetitionStatus::Pending
    );
}

#[tokio::test]
async fn decision_tick_fires_once_per_interval() {
    let harness = Harness::new();
    let competition = harness.insert_competition(-10, 600, true);
    let participant_id = harness.enroll(&competition);
    harness.client.push(Scripted::Reply(
        r#"{ "decision": "hold", "reasoning": "r", "orders": [] }"#.into(),
    ));

    // First pass: due immediately
    harness.scheduler.supervise_once().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.store.decisions_of(participant_id, 10).len(), 1);

    // Second pass inside the same 60-minute interval: nothing fires
    harness.scheduler.supervise_once().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.store.decisions_of(participant_id, 10).len(), 1);
}

#[tokio::test]
async fn completed_competition_gets_no_ticks() {
    let harness = Harness::new();
    let competition = harness.insert_competition(-120, -60, true);
    let participant_id = harness.enroll(&competition);

    // First pass completes the competition; no decision tick fires
    harness.scheduler.supervise_once().await;
    harness.scheduler.supervise_once().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        harness.store.competition(competition.id).unwrap().status,
        CompetitionStatus::Completed
    );
    assert!(harness.store.decisions_of(participant_id, 10).is_empty());
}

#[tokio::test]
async fn price_tick_runs_risk_sweep() {
    let harness = Harness::new();
    let competition = harness.insert_competition(-10, 600, true);
    let participant_id = harness.enroll(&competition);

    // Open a 10x short through a scripted round
    harness.client.push(Scripted::Reply(
        r#"{ "decision": "trade", "reasoning": "short it", "orders": [
            { "action": "open", "symbol": "BTCUSDT", "side": "sell",
              "quantity": 0.1, "leverage": 10 }
        ] }"#
            .into(),
    ));
    harness.scheduler.supervise_once().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(harness.store.trades_of(participant_id, 10).len(), 1);

    // Price trebles: 0.1 short from 50 000 loses 10 000+, equity < 0
    harness.source.set(Symbol::new("BTCUSDT"), dec("160000"));
    harness.scheduler.price_tick().await;

    let participant = harness.store.participant(participant_id).unwrap();
    assert_eq!(participant.status, ParticipantStatus::Liquidated);
    let portfolio = harness.store.portfolio_of(participant_id).unwrap();
    assert!(harness.store.positions_of(portfolio.id).is_empty());
    assert_eq!(harness.store.liquidations_of(participant_id).len(), 1);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_rounds_and_flushes_records() {
    let harness = Harness::new();
    let competition = harness.insert_competition(-10, 600, true);
    let participant_id = harness.enroll(&competition);
    harness.client.push(Scripted::Hang(Duration::from_secs(30)));

    // Fire the tick, then shut down while the model hangs
    harness.scheduler.supervise_once().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    harness.scheduler.shutdown().await;

    let decisions = harness.store.decisions_of(participant_id, 10);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].status, RoundStatus::TransportError);
    assert!(decisions[0].error.as_deref().unwrap_or("").contains("cancelled"));
}

#[tokio::test]
async fn started_loops_stop_on_shutdown() {
    let harness = Harness::new();
    harness.insert_competition(-10, 600, true);
    harness.scheduler.start();

    tokio::time::sleep(Duration::from_millis(150)).await;
    // Must return rather than hang
    tokio::time::timeout(Duration::from_secs(5), harness.scheduler.shutdown())
        .await
        .expect("shutdown hung");
}
