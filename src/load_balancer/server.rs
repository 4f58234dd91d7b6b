//! Backend server abstraction.
//!
//! # Responsibilities
//! - Represent a single simulated backend
//! - Track current load against a fixed capacity
//! - Track availability (toggled by administrative commands)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable server identifier (small positive integer, 1-based pool position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u32);

impl From<u32> for ServerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<ServerId> for u32 {
    fn from(id: ServerId) -> Self {
        id.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single backend server.
///
/// Invariant: `load <= capacity`. Load is only mutated through
/// [`ServerPool`](crate::load_balancer::pool::ServerPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Stable identity.
    pub id: ServerId,
    /// Display name.
    pub name: String,
    /// Maximum concurrent requests.
    pub capacity: u32,
    /// Relative share for weighted round robin.
    pub weight: u32,
    /// Requests currently in flight.
    pub load: u32,
    /// Whether the server accepts traffic.
    pub available: bool,
}

impl Server {
    /// Create an idle, available server.
    pub fn new(id: ServerId, name: impl Into<String>, capacity: u32, weight: u32) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            weight,
            load: 0,
            available: true,
        }
    }

    /// Available and with spare capacity.
    pub fn is_eligible(&self) -> bool {
        self.available && self.load < self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_id_conversion() {
        let id = ServerId::from(3u32);
        assert_eq!(id.0, 3);
        assert_eq!(u32::from(id), 3);
        assert_eq!(id.to_string(), "3");
    }

    #[test]
    fn test_eligibility() {
        let mut s = Server::new(ServerId(1), "a", 2, 1);
        assert!(s.is_eligible());

        s.load = 2;
        assert!(!s.is_eligible());

        s.load = 0;
        s.available = false;
        assert!(!s.is_eligible());
    }
}
