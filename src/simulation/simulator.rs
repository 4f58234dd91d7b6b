//! The simulation aggregate: pool, routing engine, lifecycle, history, clock.
//!
//! All mutation goes through `&mut Simulation`, so a single owner (or the
//! lock in [`SimulationHandle`](crate::simulation::SimulationHandle))
//! serializes ticks, completions and commands.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, SimConfig, SimulationConfig};
use crate::error::SimResult;
use crate::load_balancer::pool::{PoolSnapshot, ServerPool};
use crate::load_balancer::random::{RandomSource, StdRandom};
use crate::load_balancer::server::ServerId;
use crate::load_balancer::{Decision, Policy, RoutingEngine, RoutingOutcome};
use crate::observability::metrics;
use crate::simulation::clients::ClientIdGenerator;
use crate::simulation::clock::{ClockState, SimulationClock};
use crate::simulation::events::SimEvent;
use crate::simulation::history::{HistorySample, LoadHistory};
use crate::simulation::lifecycle::{Request, RequestLifecycle};

const EVENT_CAPACITY: usize = 256;

/// Counters since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    pub ticks: u64,
    pub routed: u64,
    pub dropped: u64,
    pub completed: u64,
    pub swept: u64,
}

/// What happened in one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub at_ms: u64,
    pub client_id: String,
    pub decision: Decision,
}

pub struct Simulation {
    settings: SimulationConfig,
    policy: Policy,
    pool: ServerPool,
    engine: RoutingEngine,
    lifecycle: RequestLifecycle,
    history: LoadHistory,
    clock: SimulationClock,
    clients: ClientIdGenerator,
    rng: Box<dyn RandomSource>,
    status: String,
    stats: SimStats,
    events: broadcast::Sender<SimEvent>,
}

impl Simulation {
    /// Build from configuration, seeding randomness from `simulation.seed`.
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        Self::with_random(config, Box::new(StdRandom::new(config.simulation.seed)))
    }

    /// Build with an explicit random source. The configuration is validated
    /// first; a zero tick interval or an all-zero weight table never reaches
    /// the timeline.
    pub fn with_random(config: &SimConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let settings = config.simulation.clone();
        let pool = ServerPool::new(&config.servers);
        let engine = RoutingEngine::new(&pool.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        for server in pool.snapshot().servers {
            metrics::record_server_load(server.id, server.load);
            metrics::record_server_available(server.id, server.available);
        }

        Ok(Self {
            lifecycle: RequestLifecycle::new(settings.service_duration_ms),
            history: LoadHistory::new(settings.history_len),
            clock: SimulationClock::new(settings.tick_interval_ms),
            clients: ClientIdGenerator::new(settings.client_population),
            policy: config.routing.policy,
            settings,
            pool,
            engine,
            rng,
            status: String::from("Idle"),
            stats: SimStats::default(),
            events,
        })
    }

    // --- Commands ---

    pub fn start(&mut self) {
        if self.clock.start() {
            tracing::info!(policy = %self.policy, now_ms = self.clock.now_ms(), "Simulation started");
            self.publish(SimEvent::Started);
        }
    }

    /// Stop generating ticks. Scheduled completions still fire.
    pub fn stop(&mut self) {
        if self.clock.stop() {
            tracing::info!(now_ms = self.clock.now_ms(), "Simulation stopped");
            self.publish(SimEvent::Stopped);
        }
    }

    /// Switch policy. Always stops and fully resets first.
    pub fn set_policy(&mut self, policy: Policy) {
        self.clear_state();
        self.policy = policy;
        self.status = format!("Policy set to {}", policy.label());
        tracing::info!(policy = %policy, "Policy changed");
        self.publish(SimEvent::PolicyChanged { policy });
    }

    /// Stop and clear loads, history, cursors, sticky table and in-flight requests.
    pub fn reset(&mut self) {
        self.clear_state();
        self.status = String::from("Simulation reset");
        tracing::info!("Simulation reset");
        self.publish(SimEvent::Reset);
    }

    /// Flip a server's availability. Returns the new value.
    pub fn toggle_availability(&mut self, id: ServerId) -> SimResult<bool> {
        let available = self.pool.toggle_availability(id)?;
        let name = self.pool.snapshot().name_of(id);
        self.status = if available {
            format!("{} is back online", name)
        } else {
            format!("{} taken offline, in-flight requests abandoned", name)
        };
        tracing::info!(server = %id, available, "Server availability changed");
        self.publish(SimEvent::AvailabilityChanged { server: id, available });
        Ok(available)
    }

    fn clear_state(&mut self) {
        self.stop();
        self.pool.reset_loads();
        self.history.clear();
        self.engine.reset();
        self.lifecycle.clear();
        self.clock.reset_ticks();
        self.stats = SimStats::default();
    }

    // --- Timeline ---

    /// Process every completion and tick due up to `target_ms`, in time order.
    /// Completions due at the same instant as a tick run first.
    pub fn advance_to(&mut self, target_ms: u64) -> Vec<TickReport> {
        let mut reports = Vec::new();
        loop {
            let completion = self.lifecycle.next_due();
            let tick = self.clock.next_tick_at();
            let next = match (completion, tick) {
                (Some(c), Some(t)) => c.min(t),
                (Some(c), None) => c,
                (None, Some(t)) => t,
                (None, None) => break,
            };
            if next > target_ms {
                break;
            }

            self.clock.set_now(next);
            if completion.is_some_and(|c| c <= next) {
                self.complete_due(next);
            } else {
                reports.push(self.run_tick());
            }
        }
        self.clock.set_now(target_ms);
        reports
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> Vec<TickReport> {
        self.advance_to(self.clock.now_ms() + delta_ms)
    }

    /// Run exactly one tick. `None` while stopped.
    pub fn step(&mut self) -> Option<TickReport> {
        let at = self.clock.next_tick_at()?;
        self.advance_to(at).pop()
    }

    /// Run up to `n` ticks, stopping early if the clock is stopped.
    pub fn run_ticks(&mut self, n: u64) -> Vec<TickReport> {
        let mut reports = Vec::new();
        for _ in 0..n {
            match self.step() {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        reports
    }

    fn run_tick(&mut self) -> TickReport {
        let tick = self.clock.begin_tick();
        let now = self.clock.now_ms();
        self.stats.ticks += 1;

        self.sweep_stale(now);

        let snapshot = self.pool.snapshot();
        self.history.push(HistorySample {
            tick,
            at_ms: now,
            loads: snapshot.loads(),
        });

        let client_id = self.clients.generate(self.rng.as_mut());
        let decision = self
            .engine
            .select_target(self.policy, &snapshot, &client_id, self.rng.as_mut());

        match decision.outcome {
            RoutingOutcome::Routed(server) => {
                self.pool.increment_load(server);
                let request = self.lifecycle.admit(server, client_id.clone(), now);
                self.stats.routed += 1;
                self.publish(SimEvent::Routed {
                    tick,
                    request_id: request.id,
                    client_id: client_id.clone(),
                    server,
                    message: decision.message.clone(),
                });
            }
            RoutingOutcome::NoCapacity => {
                self.stats.dropped += 1;
                tracing::info!(tick, client = %client_id, "Request dropped, pool saturated");
                self.publish(SimEvent::Dropped {
                    tick,
                    client_id: client_id.clone(),
                    message: decision.message.clone(),
                });
            }
        }
        self.status = decision.message.clone();

        TickReport {
            tick,
            at_ms: now,
            client_id,
            decision,
        }
    }

    fn complete_due(&mut self, now: u64) {
        for request in self.lifecycle.fire_due(now) {
            self.release(&request);
            self.stats.completed += 1;
            metrics::record_completion();
            tracing::debug!(request = request.id, server = %request.target, now_ms = now, "Request completed");
            self.publish(SimEvent::Completed {
                request_id: request.id,
                server: request.target,
                at_ms: now,
            });
        }
    }

    fn sweep_stale(&mut self, now: u64) {
        let swept = self.lifecycle.sweep(now, self.settings.max_request_age_ms);
        if swept.is_empty() {
            return;
        }
        metrics::record_swept(swept.len());
        for request in swept {
            self.release(&request);
            self.stats.swept += 1;
            tracing::warn!(
                request = request.id,
                server = %request.target,
                age_ms = now - request.admitted_at_ms,
                "Reclaimed request past maximum age"
            );
            self.publish(SimEvent::Swept {
                request_id: request.id,
                server: request.target,
                at_ms: now,
            });
        }
    }

    fn release(&mut self, request: &Request) {
        if let Err(e) = self.pool.decrement_load(request.target) {
            tracing::error!(request = request.id, error = %e, "Failed to release request");
        }
    }

    fn publish(&self, event: SimEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // --- Queries ---

    pub fn pool_snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }

    /// Oldest to newest, at most `history_len` samples.
    pub fn history_snapshot(&self) -> Vec<HistorySample> {
        self.history.snapshot()
    }

    /// Trace of the latest decision, drop or administrative event.
    pub fn last_decision_message(&self) -> &str {
        &self.status
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    pub fn stats(&self) -> SimStats {
        self.stats
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn in_flight(&self) -> Vec<Request> {
        self.lifecycle.requests()
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }

    pub fn settings(&self) -> &SimulationConfig {
        &self.settings
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("policy", &self.policy)
            .field("state", &self.clock.state())
            .field("now_ms", &self.clock.now_ms())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
