//! Scheduler
//!
//! Process-wide singleton owning two periodic jobs:
//!
//! - **price refresh** (fixed period): pull marks for every symbol any
//!   active competition allows, publish one cache tick, then run the
//!   risk sweep over every active participant;
//! - **supervision** (short period): drive competition lifecycle
//!   transitions and fire one decision tick per competition whenever its
//!   invocation interval elapses.
//!
//! Decision rounds are spawned onto a task tracker; shutdown cancels
//! in-flight invocations and waits for the rounds to flush their
//! records before returning.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use market_data::PriceService;
use orchestrator::{Orchestrator, RiskSweep, RoundOutcome, SkipReason};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use store::Store;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use types::competition::{Competition, CompetitionStatus};
use types::ids::{CompetitionId, Symbol};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Period of the price refresh job
    pub price_refresh: Duration,
    /// Period of the lifecycle/decision supervision job
    pub supervision: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            price_refresh: Duration::from_secs(15),
            supervision: Duration::from_secs(5),
        }
    }
}

pub struct Scheduler {
    store: Arc<dyn Store>,
    prices: Arc<PriceService>,
    orchestrator: Arc<Orchestrator>,
    cancel: CancellationToken,
    rounds: TaskTracker,
    loops: std::sync::Mutex<Vec<JoinHandle<()>>>,
    next_decision_due: DashMap<CompetitionId, DateTime<Utc>>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        prices: Arc<PriceService>,
        orchestrator: Arc<Orchestrator>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            prices,
            orchestrator,
            cancel: CancellationToken::new(),
            rounds: TaskTracker::new(),
            loops: std::sync::Mutex::new(Vec::new()),
            next_decision_due: DashMap::new(),
            config,
        })
    }

    /// Spawn both periodic loops.
    pub fn start(self: &Arc<Self>) {
        info!(
            price_refresh_secs = self.config.price_refresh.as_secs(),
            supervision_secs = self.config.supervision.as_secs(),
            "scheduler starting"
        );

        let price = {
            let scheduler = self.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(scheduler.config.price_refresh);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = scheduler.cancel.cancelled() => break,
                        _ = interval.tick() => scheduler.price_tick().await,
                    }
                }
            })
        };

        let supervision = {
            let scheduler = self.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(scheduler.config.supervision);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = scheduler.cancel.cancelled() => break,
                        _ = interval.tick() => scheduler.supervise_once().await,
                    }
                }
            })
        };

        let mut loops = self.loops.lock().expect("scheduler loop registry poisoned");
        loops.push(price);
        loops.push(supervision);
    }

    /// Stop accepting ticks, cancel in-flight invocations, and wait for
    /// running rounds to flush their records.
    pub async fn shutdown(&self) {
        info!("scheduler shutting down");
        self.cancel.cancel();
        self.rounds.close();
        self.rounds.wait().await;

        let loops: Vec<JoinHandle<()>> = {
            let mut guard = self.loops.lock().expect("scheduler loop registry poisoned");
            guard.drain(..).collect()
        };
        for handle in loops {
            let _ = handle.await;
        }
        info!("scheduler stopped");
    }

    /// One price refresh pass: publish a tick, then sweep every active
    /// participant for liquidation.
    pub async fn price_tick(&self) {
        let active: Vec<Competition> = self
            .store
            .competitions()
            .into_iter()
            .filter(|c| c.is_active())
            .collect();
        if active.is_empty() {
            return;
        }

        let symbols: Vec<Symbol> = active
            .iter()
            .flat_map(|c| c.allowed_symbols.iter().cloned())
            .collect::<BTreeSet<Symbol>>()
            .into_iter()
            .collect();

        if let Err(e) = self.prices.refresh(&symbols).await {
            // Sweeping against stale marks would be worse than skipping
            warn!(error = %e, "price refresh failed; skipping risk sweep this tick");
            return;
        }

        let sweeps = active
            .iter()
            .flat_map(|competition| self.store.participants_in(competition.id))
            .filter(|p| p.is_active())
            .map(|p| async move {
                (p.id, self.orchestrator.reprice_and_check(p.id).await)
            });

        for (participant_id, sweep) in join_all(sweeps).await {
            match sweep {
                Ok(RiskSweep::Liquidated { closed }) => {
                    info!(participant_id = %participant_id, closed, "risk sweep liquidated participant");
                }
                Ok(RiskSweep::Pending { remaining }) => {
                    warn!(participant_id = %participant_id, remaining, "liquidation incomplete; retrying next tick");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(participant_id = %participant_id, error = %e, "risk sweep failed");
                }
            }
        }
    }

    /// One supervision pass: lifecycle transitions plus due decision
    /// ticks.
    pub async fn supervise_once(&self) {
        let now = Utc::now();

        for mut competition in self.store.competitions() {
            match competition.status {
                CompetitionStatus::Pending if now >= competition.starts_at => {
                    if competition.start().is_ok() {
                        info!(competition_id = %competition.id, name = %competition.name, "competition started");
                        self.next_decision_due.insert(competition.id, now);
                        if let Err(e) = self.store.put_competition(competition) {
                            error!(error = %e, "failed to persist competition start");
                        }
                    }
                }
                CompetitionStatus::Active if now >= competition.ends_at => {
                    let id = competition.id;
                    if competition.complete().is_ok() {
                        info!(competition_id = %id, "competition completed at end of window");
                        self.next_decision_due.remove(&id);
                        if let Err(e) = self.store.put_competition(competition) {
                            error!(error = %e, "failed to persist competition completion");
                        }
                    }
                }
                CompetitionStatus::Active => {
                    self.maybe_fire_decision_tick(&competition, now);
                }
                _ => {}
            }
        }
    }

    fn maybe_fire_decision_tick(&self, competition: &Competition, now: DateTime<Utc>) {
        let interval = ChronoDuration::minutes(i64::from(competition.invocation_interval_minutes));
        let mut due = self
            .next_decision_due
            .entry(competition.id)
            .or_insert(now);
        if now < *due {
            return;
        }
        *due = now + interval;
        drop(due);

        if !competition.market_open_at(now) {
            debug!(competition_id = %competition.id, "market closed; decision tick skipped");
            return;
        }

        info!(competition_id = %competition.id, "decision tick");
        let orchestrator = self.orchestrator.clone();
        let cancel = self.cancel.clone();
        let competition_id = competition.id;
        self.rounds.spawn(async move {
            match orchestrator.run_competition(competition_id, &cancel).await {
                Ok(outcomes) => {
                    for (participant_id, outcome) in outcomes {
                        match outcome {
                            Ok(RoundOutcome::Skipped(SkipReason::Overlap)) => {
                                warn!(
                                    participant_id = %participant_id,
                                    "decision tick dropped; previous round still running"
                                );
                            }
                            Ok(RoundOutcome::Skipped(reason)) => {
                                debug!(participant_id = %participant_id, ?reason, "round skipped");
                            }
                            Ok(RoundOutcome::Completed(record)) => {
                                debug!(
                                    participant_id = %participant_id,
                                    status = ?record.status,
                                    "round completed"
                                );
                            }
                            Err(e) => {
                                error!(participant_id = %participant_id, error = %e, "round failed");
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(competition_id = %competition_id, error = %e, "decision tick failed");
                }
            }
        });
    }

    /// Cancellation token handed to externally triggered rounds so admin
    /// invocations honor scheduler shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
