//! Notifications published by the simulation.
//!
//! Display layers subscribe to these; they never feed back into core state.

use serde::Serialize;

use crate::load_balancer::server::ServerId;
use crate::load_balancer::Policy;
use crate::simulation::lifecycle::RequestId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    Started,
    Stopped,
    Reset,
    PolicyChanged {
        policy: Policy,
    },
    AvailabilityChanged {
        server: ServerId,
        available: bool,
    },
    Routed {
        tick: u64,
        request_id: RequestId,
        client_id: String,
        server: ServerId,
        message: String,
    },
    Dropped {
        tick: u64,
        client_id: String,
        message: String,
    },
    Completed {
        request_id: RequestId,
        server: ServerId,
        at_ms: u64,
    },
    /// Reclaimed by the safety sweep instead of its timer.
    Swept {
        request_id: RequestId,
        server: ServerId,
        at_ms: u64,
    },
}
