//! Least Connections load balancing strategy.

use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::{LoadBalancer, Selection, SelectionKind};

/// Least connections selector.
/// Selects the eligible server with the minimum load.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(
        &mut self,
        pool: &PoolSnapshot,
        _client_id: &str,
        _rng: &mut dyn RandomSource,
    ) -> Option<Selection> {
        // min_by_key keeps the first minimum, so ties go to pool order
        pool.eligible_servers()
            .into_iter()
            .min_by_key(|s| s.load)
            .map(|s| Selection {
                server: s.id,
                kind: SelectionKind::LeastLoaded { load: s.load },
            })
    }

    fn reset(&mut self) {}
}
