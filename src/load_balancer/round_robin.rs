//! Round-robin load balancing strategy.

use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::server::ServerId;
use crate::load_balancer::{LoadBalancer, Selection, SelectionKind};

/// Round-robin selector.
///
/// The cursor is an index into the eligible list as it looks at decision
/// time. It is kept across calls and reinterpreted modulo the current
/// eligible count, so a shrinking or growing eligible set can make the
/// rotation skip or repeat a server.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor value.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Pick from the eligible set and advance. The cursor only moves on success.
    pub(crate) fn rotate(&mut self, pool: &PoolSnapshot) -> Option<ServerId> {
        let eligible = pool.eligible_servers();
        if eligible.is_empty() {
            return None;
        }

        let len = eligible.len();
        let index = self.cursor % len;
        self.cursor = (index + 1) % len;
        Some(eligible[index].id)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(
        &mut self,
        pool: &PoolSnapshot,
        _client_id: &str,
        _rng: &mut dyn RandomSource,
    ) -> Option<Selection> {
        self.rotate(pool).map(|server| Selection {
            server,
            kind: SelectionKind::Rotation,
        })
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::random::ScriptedRandom;
    use crate::load_balancer::server::Server;

    fn snapshot(n: u32) -> PoolSnapshot {
        PoolSnapshot {
            servers: (1..=n).map(|i| Server::new(ServerId(i), format!("s{}", i), 10, 1)).collect(),
        }
    }

    fn pick(lb: &mut RoundRobin, pool: &PoolSnapshot) -> ServerId {
        let mut rng = ScriptedRandom::new(vec![0]);
        lb.next_server(pool, "c", &mut rng).unwrap().server
    }

    #[test]
    fn test_round_robin() {
        let mut lb = RoundRobin::new();
        let pool = snapshot(2);

        assert_eq!(pick(&mut lb, &pool), ServerId(1));
        assert_eq!(pick(&mut lb, &pool), ServerId(2));
        assert_eq!(pick(&mut lb, &pool), ServerId(1));
    }

    #[test]
    fn test_skips_ineligible() {
        let mut lb = RoundRobin::new();
        let mut pool = snapshot(3);
        pool.servers[1].available = false;

        assert_eq!(pick(&mut lb, &pool), ServerId(1));
        assert_eq!(pick(&mut lb, &pool), ServerId(3));
        assert_eq!(pick(&mut lb, &pool), ServerId(1));
    }

    #[test]
    fn test_cursor_reinterpreted_when_set_shrinks() {
        let mut lb = RoundRobin::new();
        let mut pool = snapshot(3);

        assert_eq!(pick(&mut lb, &pool), ServerId(1));
        assert_eq!(pick(&mut lb, &pool), ServerId(2));
        assert_eq!(lb.cursor(), 2);

        // Eligible set drops to [1, 2]: cursor 2 wraps to index 0
        pool.servers[2].available = false;
        assert_eq!(pick(&mut lb, &pool), ServerId(1));
    }

    #[test]
    fn test_empty_leaves_cursor() {
        let mut lb = RoundRobin::new();
        let mut pool = snapshot(2);
        pick(&mut lb, &pool);

        for s in &mut pool.servers {
            s.available = false;
        }
        let mut rng = ScriptedRandom::new(vec![0]);
        assert!(lb.next_server(&pool, "c", &mut rng).is_none());
        assert_eq!(lb.cursor(), 1);
    }

    #[test]
    fn test_even_distribution() {
        let mut lb = RoundRobin::new();
        let pool = snapshot(3);
        let mut counts = [0usize; 3];

        for _ in 0..10 {
            let id = pick(&mut lb, &pool);
            counts[(id.0 - 1) as usize] += 1;
        }

        // 10 picks over 3 servers: each gets 3 or 4
        for c in counts {
            assert!(c == 3 || c == 4, "count {} out of range", c);
        }
    }
}
