//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Tick generates a client id
//!     → pool.rs (value snapshot of all servers)
//!     → engine.rs (saturation check, dispatch on active policy):
//!         - round_robin.rs (rotate through eligible servers)
//!         - weighted.rs (walk weighted sequence, random fallback)
//!         - least_conn.rs (pick eligible server with lowest load)
//!         - ip_hash.rs (sticky table, rotation for new/stale clients)
//!     → Decision { Routed(id) | NoCapacity } + human readable message
//! ```
//!
//! # Design Decisions
//! - Each strategy owns its own cursor; none reads another's state
//! - Strategies only see snapshots; the pool applies the outcome
//! - Randomness is injected through `random::RandomSource`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::load_balancer::pool::PoolSnapshot;
use crate::load_balancer::random::RandomSource;
use crate::load_balancer::server::ServerId;

pub mod engine;
pub mod ip_hash;
pub mod least_conn;
pub mod pool;
pub mod random;
pub mod round_robin;
pub mod server;
pub mod weighted;

pub use engine::{Decision, RoutingEngine};

/// Routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Rotate through eligible servers.
    #[default]
    RoundRobin,
    /// Rotate through a sequence where each server appears `weight` times.
    WeightedRoundRobin,
    /// Pick the eligible server with the fewest in-flight requests.
    LeastConnections,
    /// Pin each client to a server for as long as it stays eligible.
    IpHash,
}

impl Policy {
    /// All policies, in display order.
    pub const ALL: [Policy; 4] = [
        Policy::RoundRobin,
        Policy::WeightedRoundRobin,
        Policy::LeastConnections,
        Policy::IpHash,
    ];

    /// Stable identifier used in config files and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::RoundRobin => "round_robin",
            Policy::WeightedRoundRobin => "weighted_round_robin",
            Policy::LeastConnections => "least_connections",
            Policy::IpHash => "ip_hash",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Policy::RoundRobin => "Round robin",
            Policy::WeightedRoundRobin => "Weighted round robin",
            Policy::LeastConnections => "Least connections",
            Policy::IpHash => "IP hash",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown policy '{0}' (expected one of round_robin, weighted_round_robin, least_connections, ip_hash)")]
pub struct UnknownPolicy(pub String);

impl FromStr for Policy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "round_robin" | "rr" => Ok(Policy::RoundRobin),
            "weighted_round_robin" | "weighted" | "wrr" => Ok(Policy::WeightedRoundRobin),
            "least_connections" | "least_conn" | "lc" => Ok(Policy::LeastConnections),
            "ip_hash" | "sticky" => Ok(Policy::IpHash),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// How a strategy arrived at its pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionKind {
    /// Plain rotation over eligible servers.
    Rotation,
    /// The weighted sequence slot was eligible.
    WeightedSlot,
    /// The weighted slot was ineligible; a random eligible server was used.
    WeightedFallback { intended: ServerId },
    /// Lowest-load eligible server.
    LeastLoaded { load: u32 },
    /// Existing sticky session reused.
    StickyReuse,
    /// First request from this client.
    StickyNew,
    /// Previous sticky server became ineligible; session moved.
    StickyReassigned { previous: ServerId },
}

/// A strategy's pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub server: ServerId,
    pub kind: SelectionKind,
}

/// Result of a routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingOutcome {
    /// Request goes to this server.
    Routed(ServerId),
    /// No eligible server; the request is dropped.
    NoCapacity,
}

impl RoutingOutcome {
    /// Target server, if routed.
    pub fn target(&self) -> Option<ServerId> {
        match self {
            RoutingOutcome::Routed(id) => Some(*id),
            RoutingOutcome::NoCapacity => None,
        }
    }
}

/// A routing strategy with private cursor state.
pub trait LoadBalancer: fmt::Debug + Send {
    /// Pick an eligible server, or `None` when none is eligible.
    fn next_server(
        &mut self,
        pool: &PoolSnapshot,
        client_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Option<Selection>;

    /// Forget all cursor and session state.
    fn reset(&mut self);
}
