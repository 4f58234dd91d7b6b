//! Routing decision engine.
//!
//! # Responsibilities
//! - Own every strategy's cursor and session state
//! - Short-circuit saturation before any strategy except weighted round
//!   robin, whose cursor advances on every attempt
//! - Produce a human readable trace of each decision

use serde::Serialize;

use crate::load_balancer::ip_hash::IpHash;
use crate::load_balancer::least_conn::LeastConnections;
use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::server::ServerId;
use crate::load_balancer::weighted::WeightedRoundRobin;
use crate::load_balancer::{LoadBalancer, Policy, RoutingOutcome, Selection, SelectionKind};
use crate::observability::metrics;

/// Outcome of one routing decision plus its trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub outcome: RoutingOutcome,
    /// How the strategy picked; `None` on `NoCapacity`.
    pub kind: Option<SelectionKind>,
    pub message: String,
}

/// Stateful policy selector.
#[derive(Debug)]
pub struct RoutingEngine {
    round_robin: RoundRobin,
    weighted: WeightedRoundRobin,
    least_conn: LeastConnections,
    ip_hash: IpHash,
}

impl RoutingEngine {
    /// Create an engine for a pool layout. The weighted sequence is
    /// derived from this snapshot's weights, which never change.
    pub fn new(layout: &PoolSnapshot) -> Self {
        Self {
            round_robin: RoundRobin::new(),
            weighted: WeightedRoundRobin::new(layout),
            least_conn: LeastConnections::new(),
            ip_hash: IpHash::new(),
        }
    }

    fn strategy(&mut self, policy: Policy) -> &mut dyn LoadBalancer {
        match policy {
            Policy::RoundRobin => &mut self.round_robin,
            Policy::WeightedRoundRobin => &mut self.weighted,
            Policy::LeastConnections => &mut self.least_conn,
            Policy::IpHash => &mut self.ip_hash,
        }
    }

    /// Select a target for `client_id` under `policy`.
    ///
    /// On a saturated pool only the weighted cursor moves.
    pub fn select_target(
        &mut self,
        policy: Policy,
        pool: &PoolSnapshot,
        client_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Decision {
        let dispatch = policy == Policy::WeightedRoundRobin || !pool.eligible_servers().is_empty();
        let selection = if dispatch {
            self.strategy(policy).next_server(pool, client_id, rng)
        } else {
            None
        };

        let decision = match selection {
            Some(Selection { server, kind }) => {
                let message = describe(policy, pool, client_id, server, &kind);
                Decision {
                    outcome: RoutingOutcome::Routed(server),
                    kind: Some(kind),
                    message,
                }
            }
            None => Decision {
                outcome: RoutingOutcome::NoCapacity,
                kind: None,
                message: format!(
                    "{}: no server available, request from {} dropped",
                    policy.label(),
                    client_id
                ),
            },
        };

        metrics::record_decision(policy, &decision.outcome);
        tracing::debug!(
            policy = %policy,
            client = %client_id,
            outcome = ?decision.outcome,
            "{}",
            decision.message
        );
        decision
    }

    /// Clear all cursors and the sticky table.
    pub fn reset(&mut self) {
        self.round_robin.reset();
        self.weighted.reset();
        self.least_conn.reset();
        self.ip_hash.reset();
    }

    /// Sticky mapping for a client, if any.
    pub fn sticky_session(&self, client_id: &str) -> Option<ServerId> {
        self.ip_hash.session(client_id)
    }

    /// Number of entries in the sticky table.
    pub fn sticky_sessions(&self) -> usize {
        self.ip_hash.session_count()
    }

    /// Round-robin cursor.
    pub fn round_robin_cursor(&self) -> usize {
        self.round_robin.cursor()
    }

    /// Weighted round-robin cursor.
    pub fn weighted_cursor(&self) -> usize {
        self.weighted.cursor()
    }
}

fn describe(
    policy: Policy,
    pool: &PoolSnapshot,
    client_id: &str,
    server: ServerId,
    kind: &SelectionKind,
) -> String {
    let name = pool.name_of(server);
    match kind {
        SelectionKind::Rotation => format!("{}: {} -> {}", policy.label(), client_id, name),
        SelectionKind::WeightedSlot => {
            format!("{}: {} -> {} (weighted slot)", policy.label(), client_id, name)
        }
        SelectionKind::WeightedFallback { intended } => format!(
            "{}: {} unavailable, {} -> {} (random fallback)",
            policy.label(),
            pool.name_of(*intended),
            client_id,
            name
        ),
        SelectionKind::LeastLoaded { load } => format!(
            "{}: {} -> {} ({} active)",
            policy.label(),
            client_id,
            name,
            load
        ),
        SelectionKind::StickyReuse => {
            format!("{}: {} -> {} (session reused)", policy.label(), client_id, name)
        }
        SelectionKind::StickyNew => {
            format!("{}: {} -> {} (new session)", policy.label(), client_id, name)
        }
        SelectionKind::StickyReassigned { previous } => format!(
            "{}: {} lost, {} moved to {}",
            policy.label(),
            pool.name_of(*previous),
            client_id,
            name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::random::ScriptedRandom;
    use crate::load_balancer::server::Server;

    fn snapshot(weights: &[u32]) -> PoolSnapshot {
        PoolSnapshot {
            servers: weights
                .iter()
                .enumerate()
                .map(|(i, &w)| Server::new(ServerId(i as u32 + 1), format!("server-{}", i + 1), 2, w))
                .collect(),
        }
    }

    #[test]
    fn test_saturation_returns_no_capacity() {
        let mut pool = snapshot(&[1, 1]);
        let mut engine = RoutingEngine::new(&pool);
        let mut rng = ScriptedRandom::new(vec![0]);

        engine.select_target(Policy::RoundRobin, &pool, "a", &mut rng);
        engine.select_target(Policy::WeightedRoundRobin, &pool, "a", &mut rng);
        let rr = engine.round_robin_cursor();
        let wrr = engine.weighted_cursor();

        pool.servers[0].available = false;
        pool.servers[1].load = 2;
        for policy in Policy::ALL {
            let d = engine.select_target(policy, &pool, "z", &mut rng);
            assert_eq!(d.outcome, RoutingOutcome::NoCapacity);
            assert!(d.kind.is_none());
            assert!(d.message.contains("dropped"));
        }
        assert_eq!(engine.round_robin_cursor(), rr);
        assert_eq!(engine.weighted_cursor(), (wrr + 1) % 2);
        assert_eq!(engine.sticky_sessions(), 0);
    }

    #[test]
    fn test_weighted_cursor_advances_on_saturated_attempt() {
        let mut pool = snapshot(&[1, 1, 1]);
        let mut engine = RoutingEngine::new(&pool);
        let mut rng = ScriptedRandom::new(vec![0]);

        let d = engine.select_target(Policy::WeightedRoundRobin, &pool, "a", &mut rng);
        assert_eq!(d.outcome, RoutingOutcome::Routed(ServerId(1)));
        assert_eq!(engine.weighted_cursor(), 1);

        for server in &mut pool.servers {
            server.load = server.capacity;
        }
        let d = engine.select_target(Policy::WeightedRoundRobin, &pool, "b", &mut rng);
        assert_eq!(d.outcome, RoutingOutcome::NoCapacity);
        assert_eq!(engine.weighted_cursor(), 2);

        // The slot skipped while saturated is not revisited
        for server in &mut pool.servers {
            server.load = 0;
        }
        let d = engine.select_target(Policy::WeightedRoundRobin, &pool, "c", &mut rng);
        assert_eq!(d.outcome, RoutingOutcome::Routed(ServerId(3)));
        assert_eq!(d.kind, Some(SelectionKind::WeightedSlot));
    }

    #[test]
    fn test_policies_keep_separate_cursors() {
        let pool = snapshot(&[1, 1, 1]);
        let mut engine = RoutingEngine::new(&pool);
        let mut rng = ScriptedRandom::new(vec![0]);

        engine.select_target(Policy::RoundRobin, &pool, "a", &mut rng);
        engine.select_target(Policy::RoundRobin, &pool, "b", &mut rng);

        // IP hash rotation starts from its own cursor
        let d = engine.select_target(Policy::IpHash, &pool, "c", &mut rng);
        assert_eq!(d.outcome, RoutingOutcome::Routed(ServerId(1)));
        assert_eq!(engine.round_robin_cursor(), 2);
    }

    #[test]
    fn test_reset_clears_state() {
        let pool = snapshot(&[1, 1, 1]);
        let mut engine = RoutingEngine::new(&pool);
        let mut rng = ScriptedRandom::new(vec![0]);

        engine.select_target(Policy::RoundRobin, &pool, "a", &mut rng);
        engine.select_target(Policy::WeightedRoundRobin, &pool, "a", &mut rng);
        engine.select_target(Policy::IpHash, &pool, "a", &mut rng);
        engine.reset();

        assert_eq!(engine.round_robin_cursor(), 0);
        assert_eq!(engine.weighted_cursor(), 0);
        assert_eq!(engine.sticky_sessions(), 0);
        assert_eq!(engine.sticky_session("a"), None);
    }

    #[test]
    fn test_messages_name_servers() {
        let mut pool = snapshot(&[1, 1]);
        let mut engine = RoutingEngine::new(&pool);
        let mut rng = ScriptedRandom::new(vec![0]);

        let d = engine.select_target(Policy::RoundRobin, &pool, "10.0.0.7", &mut rng);
        assert_eq!(d.message, "Round robin: 10.0.0.7 -> server-1");

        pool.servers[0].available = false;
        let d = engine.select_target(Policy::WeightedRoundRobin, &pool, "x", &mut rng);
        assert!(d.message.contains("server-1 unavailable"));
        assert!(d.message.contains("random fallback"));
    }
}
