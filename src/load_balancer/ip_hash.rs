//! Sticky-session (IP hash) load balancing strategy.

use std::collections::HashMap;

use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::server::ServerId;
use crate::load_balancer::{LoadBalancer, Selection, SelectionKind};

/// Sticky-session selector.
///
/// A client keeps its server while that server stays eligible. New clients,
/// and clients whose server became ineligible, are placed by a private
/// rotation and the table entry is (re)written. Entries are never evicted.
#[derive(Debug, Default)]
pub struct IpHash {
    rotation: RoundRobin,
    sessions: HashMap<String, ServerId>,
}

impl IpHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server currently pinned for `client_id`, eligible or not.
    pub fn session(&self, client_id: &str) -> Option<ServerId> {
        self.sessions.get(client_id).copied()
    }

    /// Number of clients in the sticky table.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl LoadBalancer for IpHash {
    fn next_server(
        &mut self,
        pool: &PoolSnapshot,
        client_id: &str,
        _rng: &mut dyn RandomSource,
    ) -> Option<Selection> {
        let previous = self.sessions.get(client_id).copied();

        if let Some(server) = previous {
            if pool.is_eligible(server) {
                return Some(Selection {
                    server,
                    kind: SelectionKind::StickyReuse,
                });
            }
        }

        let server = self.rotation.rotate(pool)?;
        self.sessions.insert(client_id.to_string(), server);

        let kind = match previous {
            Some(previous) => SelectionKind::StickyReassigned { previous },
            None => SelectionKind::StickyNew,
        };
        Some(Selection { server, kind })
    }

    fn reset(&mut self) {
        self.rotation.reset();
        self.sessions.clear();
    }
}
