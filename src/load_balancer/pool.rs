//! Server pool management.
//!
//! # Responsibilities
//! - Own the authoritative state of every backend
//! - Enforce the load invariant (`0 <= load <= capacity`)
//! - Hand out value snapshots for routing and display

use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::{SimError, SimResult};
use crate::load_balancer::server::{Server, ServerId};
use crate::observability::metrics;

/// Read-only copy of the pool at one instant.
///
/// Holds owned values, so routing decisions never alias live pool state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Servers in pool order.
    pub servers: Vec<Server>,
}

impl PoolSnapshot {
    /// Servers that can accept a request right now, in pool order.
    /// Empty means the pool is saturated.
    pub fn eligible_servers(&self) -> Vec<&Server> {
        self.servers.iter().filter(|s| s.is_eligible()).collect()
    }

    /// Look up a server by id.
    pub fn get(&self, id: ServerId) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// Whether the given server is currently eligible.
    pub fn is_eligible(&self, id: ServerId) -> bool {
        self.get(id).is_some_and(Server::is_eligible)
    }

    /// Display name for a server, falling back to its id.
    pub fn name_of(&self, id: ServerId) -> String {
        self.get(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("server {}", id))
    }

    /// Current load of every server, in pool order.
    pub fn loads(&self) -> Vec<u32> {
        self.servers.iter().map(|s| s.load).collect()
    }
}

/// Ordered, fixed-size collection of servers.
#[derive(Debug, Clone)]
pub struct ServerPool {
    servers: Vec<Server>,
}

impl ServerPool {
    /// Build a pool from configuration. Ids are assigned 1..=n in order.
    pub fn new(configs: &[ServerConfig]) -> Self {
        let servers = configs
            .iter()
            .enumerate()
            .map(|(i, c)| Server::new(ServerId(i as u32 + 1), c.name.clone(), c.capacity, c.weight))
            .collect();
        Self { servers }
    }

    /// Build a pool directly from servers.
    pub fn from_servers(servers: Vec<Server>) -> Self {
        Self { servers }
    }

    /// Look up a server by id.
    pub fn get(&self, id: ServerId) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: ServerId) -> SimResult<&mut Server> {
        self.servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SimError::InvalidServerReference(id))
    }

    /// Admit one request on `id`.
    ///
    /// # Panics
    /// If the server does not exist or is not eligible. Routing only returns
    /// eligible ids, so reaching this is a caller defect.
    pub fn increment_load(&mut self, id: ServerId) {
        let server = self
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .unwrap_or_else(|| panic!("increment_load on unknown server {}", id));
        assert!(
            server.is_eligible(),
            "increment_load on ineligible server {} (load {}/{}, available {})",
            id,
            server.load,
            server.capacity,
            server.available
        );
        server.load += 1;
        metrics::record_server_load(id, server.load);
    }

    /// Release one request on `id`. Clamped at zero, legal on unavailable servers.
    pub fn decrement_load(&mut self, id: ServerId) -> SimResult<()> {
        let server = self.get_mut(id)?;
        server.load = server.load.saturating_sub(1);
        metrics::record_server_load(id, server.load);
        Ok(())
    }

    /// Set availability. Going unavailable abandons in-flight load.
    pub fn set_availability(&mut self, id: ServerId, available: bool) -> SimResult<()> {
        let server = self.get_mut(id)?;
        if server.available && !available {
            tracing::debug!(server = %id, abandoned = server.load, "Server going unavailable, load reset");
            server.load = 0;
        }
        server.available = available;
        metrics::record_server_load(id, server.load);
        metrics::record_server_available(id, available);
        Ok(())
    }

    /// Flip availability and return the new value.
    pub fn toggle_availability(&mut self, id: ServerId) -> SimResult<bool> {
        let next = !self.get(id).ok_or(SimError::InvalidServerReference(id))?.available;
        self.set_availability(id, next)?;
        Ok(next)
    }

    /// Zero every server's load. Availability is left untouched.
    pub fn reset_loads(&mut self) {
        for server in &mut self.servers {
            server.load = 0;
            metrics::record_server_load(server.id, 0);
        }
    }

    /// Value copy of every server.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            servers: self.servers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ServerPool {
        ServerPool::from_servers(vec![
            Server::new(ServerId(1), "a", 2, 1),
            Server::new(ServerId(2), "b", 1, 1),
            Server::new(ServerId(3), "c", 3, 1),
        ])
    }

    #[test]
    fn test_eligible_servers_excludes_full_and_unavailable() {
        let mut p = pool();
        p.increment_load(ServerId(2));
        p.set_availability(ServerId(3), false).unwrap();

        let ids: Vec<_> = p.snapshot().eligible_servers().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![ServerId(1)]);
    }

    #[test]
    fn test_decrement_clamps_at_zero() {
        let mut p = pool();
        p.decrement_load(ServerId(1)).unwrap();
        assert_eq!(p.get(ServerId(1)).unwrap().load, 0);

        p.increment_load(ServerId(1));
        p.decrement_load(ServerId(1)).unwrap();
        p.decrement_load(ServerId(1)).unwrap();
        assert_eq!(p.get(ServerId(1)).unwrap().load, 0);
    }

    #[test]
    fn test_unavailable_resets_load() {
        let mut p = pool();
        p.increment_load(ServerId(3));
        p.increment_load(ServerId(3));
        p.set_availability(ServerId(3), false).unwrap();
        assert_eq!(p.get(ServerId(3)).unwrap().load, 0);

        // Decrement on an unavailable server is still legal
        p.decrement_load(ServerId(3)).unwrap();
        assert_eq!(p.get(ServerId(3)).unwrap().load, 0);
    }

    #[test]
    fn test_becoming_available_keeps_load() {
        let mut p = pool();
        p.set_availability(ServerId(1), false).unwrap();
        p.set_availability(ServerId(1), true).unwrap();
        assert!(p.get(ServerId(1)).unwrap().available);
        assert_eq!(p.get(ServerId(1)).unwrap().load, 0);
    }

    #[test]
    fn test_toggle_availability() {
        let mut p = pool();
        assert!(!p.toggle_availability(ServerId(2)).unwrap());
        assert!(p.toggle_availability(ServerId(2)).unwrap());
    }

    #[test]
    fn test_unknown_server_is_reported() {
        let mut p = pool();
        let before = p.snapshot();
        assert_eq!(
            p.toggle_availability(ServerId(42)),
            Err(SimError::InvalidServerReference(ServerId(42)))
        );
        assert_eq!(
            p.decrement_load(ServerId(0)),
            Err(SimError::InvalidServerReference(ServerId(0)))
        );
        assert_eq!(p.snapshot(), before);
    }

    #[test]
    #[should_panic(expected = "ineligible")]
    fn test_increment_full_server_panics() {
        let mut p = pool();
        p.increment_load(ServerId(2));
        p.increment_load(ServerId(2));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut p = pool();
        let snap = p.snapshot();
        p.increment_load(ServerId(1));
        assert_eq!(snap.get(ServerId(1)).unwrap().load, 0);
        assert_eq!(p.snapshot().loads(), vec![1, 0, 0]);
    }
}
