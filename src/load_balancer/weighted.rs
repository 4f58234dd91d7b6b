//! Weighted round-robin load balancing strategy.

use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::server::ServerId;
use crate::load_balancer::{LoadBalancer, Selection, SelectionKind};

/// Weighted round-robin selector.
///
/// Walks a virtual sequence in which each server id appears `weight` times
/// in pool order. The cursor advances on every attempt. When the slot's
/// server is ineligible, a uniformly random eligible server is used instead,
/// which keeps requests flowing at the cost of weight fidelity.
#[derive(Debug)]
pub struct WeightedRoundRobin {
    sequence: Vec<ServerId>,
    cursor: usize,
}

impl WeightedRoundRobin {
    /// Build the weighted sequence from the pool layout. Weights are fixed.
    pub fn new(pool: &PoolSnapshot) -> Self {
        let sequence = pool
            .servers
            .iter()
            .flat_map(|s| std::iter::repeat(s.id).take(s.weight as usize))
            .collect();
        Self { sequence, cursor: 0 }
    }

    /// The precomputed virtual sequence.
    pub fn sequence(&self) -> &[ServerId] {
        &self.sequence
    }

    /// Current cursor value.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl LoadBalancer for WeightedRoundRobin {
    fn next_server(
        &mut self,
        pool: &PoolSnapshot,
        _client_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Option<Selection> {
        if self.sequence.is_empty() {
            return None;
        }

        let intended = self.sequence[self.cursor % self.sequence.len()];
        self.cursor = (self.cursor + 1) % self.sequence.len();

        if pool.is_eligible(intended) {
            return Some(Selection {
                server: intended,
                kind: SelectionKind::WeightedSlot,
            });
        }

        let eligible = pool.eligible_servers();
        if eligible.is_empty() {
            return None;
        }
        let pick = eligible[rng.next_index(eligible.len())].id;
        Some(Selection {
            server: pick,
            kind: SelectionKind::WeightedFallback { intended },
        })
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}
