//! Error types for simulator commands.
//!
//! Routing saturation is not represented here: a request that finds no
//! eligible server is an ordinary [`RoutingOutcome::NoCapacity`] result.
//!
//! [`RoutingOutcome::NoCapacity`]: crate::load_balancer::RoutingOutcome::NoCapacity

use thiserror::Error;

use crate::load_balancer::server::ServerId;

/// Errors reported back to the caller of a simulator command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The command referenced a server id that is not part of the pool.
    #[error("unknown server id {0}")]
    InvalidServerReference(ServerId),
}

/// Result type for simulator commands.
pub type SimResult<T> = Result<T, SimError>;
